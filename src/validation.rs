use crate::Result;
use crate::classify::{self, IntegerBounds, Rejection};
use crate::dom::NodeId;
use crate::page::Page;
use crate::recovery::FocusRecovery;

/// Which classifier guards a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Integer(IntegerBounds),
    PostalCode,
    PhoneNumber,
    EmailAddress,
    WebsiteAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Carries the value the field should be rewritten to, if any.
    Accepted(Option<String>),
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

impl FieldRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::PostalCode => "postal-code",
            Self::PhoneNumber => "phone-number",
            Self::EmailAddress => "email-address",
            Self::WebsiteAddress => "website-address",
        }
    }

    /// Applies the rule to a raw value without touching any field.
    ///
    /// An empty value is always accepted; for integers it is rewritten to
    /// `"0"`.
    pub fn classify(&self, value: &str) -> ValidationOutcome {
        let normalized = match self {
            Self::Integer(bounds) => {
                if value.is_empty() {
                    return ValidationOutcome::Accepted(Some("0".into()));
                }
                classify::parse_bounded_integer(value, *bounds).map(|_| None)
            }
            Self::PostalCode => classify::parse_postal_code(value).map(Some),
            Self::PhoneNumber => classify::parse_phone_number(value).map(Some),
            Self::EmailAddress => {
                accept_if(value, classify::is_email_address_valid, Rejection::NotAnEmailAddress)
            }
            Self::WebsiteAddress => accept_if(
                value,
                classify::is_website_address_valid,
                Rejection::NotAWebsiteAddress,
            ),
        };

        match normalized {
            Ok(Some(rewritten)) if rewritten == value => ValidationOutcome::Accepted(None),
            Ok(rewritten) => ValidationOutcome::Accepted(rewritten),
            Err(rejection) => ValidationOutcome::Rejected(rejection.to_string()),
        }
    }
}

fn accept_if(
    value: &str,
    is_valid: fn(&str) -> bool,
    rejection: Rejection,
) -> std::result::Result<Option<String>, Rejection> {
    if value.is_empty() || is_valid(value) {
        Ok(None)
    } else {
        Err(rejection)
    }
}

/// Validates fields on change: rewrites accepted values to their normal
/// form and hands rejections to [`FocusRecovery`].
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    recovery: FocusRecovery,
}

impl FieldValidator {
    pub fn new(recovery: FocusRecovery) -> Self {
        Self { recovery }
    }

    pub fn recovery(&self) -> &FocusRecovery {
        &self.recovery
    }

    pub fn validate(
        &self,
        page: &mut Page,
        field: NodeId,
        rule: FieldRule,
    ) -> Result<ValidationOutcome> {
        let value = page.value(field)?;
        let outcome = rule.classify(&value);
        let label = page.trace_node_label(field);

        match &outcome {
            ValidationOutcome::Accepted(Some(rewritten)) => {
                page.set_value(field, rewritten)?;
                page.trace(format!(
                    "[validate] {} target={label} accepted rewritten={rewritten:?}",
                    rule.name()
                ));
            }
            ValidationOutcome::Accepted(None) => {
                page.trace(format!("[validate] {} target={label} accepted", rule.name()));
            }
            ValidationOutcome::Rejected(message) => {
                page.trace(format!(
                    "[validate] {} target={label} rejected message={message:?}",
                    rule.name()
                ));
                self.recovery.schedule_recovery(page, field, message);
            }
        }

        Ok(outcome)
    }

    /// Runs [`validate`](Self::validate) on every `change` of `field`.
    pub fn attach(&self, page: &mut Page, field: NodeId, rule: FieldRule) {
        let validator = self.clone();
        page.add_event_listener(field, "change", move |page, event| {
            validator.validate(page, event.target(), rule).map(|_| ())
        });
    }
}
