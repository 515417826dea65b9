use crate::Result;
use crate::dom::NodeId;
use crate::page::Page;

/// What a checked source control does to the named field groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    /// Checked enables the groups, unchecked disables them.
    EnableWhenChecked,
    /// Checked disables the groups, unchecked enables them.
    DisableWhenChecked,
}

/// Enables or disables every field sharing a name, driven by a radio button
/// or checkbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldGroupToggler;

impl FieldGroupToggler {
    pub fn new() -> Self {
        Self
    }

    pub fn set_group_enabled(
        &self,
        page: &mut Page,
        source: NodeId,
        names: &[&str],
    ) -> Result<()> {
        self.apply(page, source, names, GroupAction::EnableWhenChecked)
    }

    pub fn set_group_disabled(
        &self,
        page: &mut Page,
        source: NodeId,
        names: &[&str],
    ) -> Result<()> {
        self.apply(page, source, names, GroupAction::DisableWhenChecked)
    }

    /// Groups are processed left to right; a failure part-way leaves the
    /// earlier groups updated.
    pub fn apply(
        &self,
        page: &mut Page,
        source: NodeId,
        names: &[&str],
        action: GroupAction,
    ) -> Result<()> {
        let checked = page.checked(source)?;
        let disabled = match action {
            GroupAction::EnableWhenChecked => !checked,
            GroupAction::DisableWhenChecked => checked,
        };

        for name in names {
            let group = page.by_name(name);
            for field in &group {
                page.set_disabled(*field, disabled)?;
            }
            page.trace(format!(
                "[toggle] name={name} fields={} disabled={disabled}",
                group.len()
            ));
        }
        Ok(())
    }

    /// Applies `action` whenever `source` is clicked.
    pub fn attach(&self, page: &mut Page, source: NodeId, names: &[&str], action: GroupAction) {
        let toggler = *self;
        let names = names.iter().map(|name| (*name).to_string()).collect::<Vec<_>>();
        page.add_event_listener(source, "click", move |page, event| {
            let names = names.iter().map(String::as_str).collect::<Vec<_>>();
            toggler.apply(page, event.target(), &names, action)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE_FORM: &str = r#"
        <input type=radio name=role id=deacon checked>
        <input type=radio name=role id=other>
        <input type=text name=title id=title disabled>
        <input type=text name=title id=title2 disabled>
        <input type=text name=note id=note>
    "#;

    #[test]
    fn enable_and_disable_follow_the_source_checked_state() -> Result<()> {
        let mut h = Page::from_html(ROLE_FORM)?;
        let other = h.select_one("#other")?;
        let deacon = h.select_one("#deacon")?;
        let toggler = FieldGroupToggler::new();

        toggler.set_group_enabled(&mut h, other, &["title"])?;
        h.assert_disabled("#title", true)?;

        h.click("#other")?;
        toggler.set_group_enabled(&mut h, other, &["title", "note"])?;
        h.assert_disabled("#title", false)?;
        h.assert_disabled("#title2", false)?;
        h.assert_disabled("#note", false)?;

        h.click("#deacon")?;
        toggler.set_group_disabled(&mut h, deacon, &["title"])?;
        h.assert_disabled("#title", true)?;
        h.assert_disabled("#title2", true)?;
        h.assert_disabled("#note", false)?;
        Ok(())
    }

    #[test]
    fn unknown_names_are_skipped() -> Result<()> {
        let mut h = Page::from_html(ROLE_FORM)?;
        let deacon = h.select_one("#deacon")?;
        FieldGroupToggler::new().set_group_disabled(&mut h, deacon, &["missing", "note"])?;
        h.assert_disabled("#note", true)?;
        Ok(())
    }

    #[test]
    fn attached_radio_buttons_drive_the_group() -> Result<()> {
        let mut h = Page::from_html(ROLE_FORM)?;
        let toggler = FieldGroupToggler::new();
        let deacon = h.select_one("#deacon")?;
        let other = h.select_one("#other")?;
        toggler.attach(&mut h, deacon, &["title"], GroupAction::DisableWhenChecked);
        toggler.attach(&mut h, other, &["title"], GroupAction::EnableWhenChecked);

        h.click("#other")?;
        h.assert_disabled("#title", false)?;
        h.click("#deacon")?;
        h.assert_disabled("#title", true)?;
        Ok(())
    }
}
