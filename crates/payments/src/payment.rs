use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use offchain_command::SharedObject;
use offchain_core::{CommandError, CommandResult, ObjectId, ValueObject, Version};

/// Status of one side of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    None,
    NeedsKycData,
    ReadyForSettlement,
    Settled,
    Abort,
}

/// One party's view of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentActor {
    pub subaddress: String,
    pub status: PaymentStatus,
}

impl PaymentActor {
    pub fn new(subaddress: impl Into<String>, status: PaymentStatus) -> Self {
        Self {
            subaddress: subaddress.into(),
            status,
        }
    }
}

/// What is being paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAction {
    pub amount: u64,
    pub currency: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl PaymentAction {
    pub fn new(
        amount: u64,
        currency: impl Into<String>,
        action: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> CommandResult<Self> {
        let action = Self {
            amount,
            currency: currency.into(),
            action: action.into(),
            timestamp,
        };
        action.validate()?;
        Ok(action)
    }

    fn validate(&self) -> CommandResult<()> {
        if self.amount == 0 {
            return Err(CommandError::malformed("payment amount must be positive"));
        }
        if self.currency.trim().is_empty() {
            return Err(CommandError::malformed("currency cannot be empty"));
        }
        if self.action.trim().is_empty() {
            return Err(CommandError::malformed("action cannot be empty"));
        }
        Ok(())
    }
}

/// Shared object: one revision of a payment.
///
/// `reference_id` names the payment across revisions; `version` names this
/// revision and `previous_version` the one it supersedes (none for the first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentObject {
    pub reference_id: ObjectId,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<Version>,
    pub sender: PaymentActor,
    pub receiver: PaymentActor,
    pub action: PaymentAction,
}

impl PaymentObject {
    /// First revision of a new payment.
    pub fn new(
        reference_id: impl Into<String>,
        version: impl Into<Version>,
        sender: PaymentActor,
        receiver: PaymentActor,
        action: PaymentAction,
    ) -> CommandResult<Self> {
        let payment = Self {
            reference_id: ObjectId::new(reference_id)?,
            version: version.into(),
            previous_version: None,
            sender,
            receiver,
            action,
        };
        payment.validate()?;
        Ok(payment)
    }

    /// Next revision of this payment, superseding `self`.
    pub fn new_version(&self, version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            previous_version: Some(self.version.clone()),
            ..self.clone()
        }
    }

    /// Invariant check, applied on construction and on every decode.
    pub fn validate(&self) -> CommandResult<()> {
        if self.previous_version.as_ref() == Some(&self.version) {
            return Err(CommandError::malformed(format!(
                "payment `{}` cannot supersede its own version {}",
                self.reference_id, self.version
            )));
        }
        self.action.validate()
    }
}

impl ValueObject for PaymentObject {}

impl SharedObject for PaymentObject {
    fn object_id(&self) -> &ObjectId {
        &self.reference_id
    }

    fn version(&self) -> &Version {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_payment() -> PaymentObject {
        PaymentObject::new(
            "ref-1",
            1,
            PaymentActor::new("aaaa", PaymentStatus::None),
            PaymentActor::new("bbbb", PaymentStatus::None),
            PaymentAction::new(10, "LBT", "charge", test_time()).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn reference_id_cannot_be_empty() {
        let err = PaymentObject::new(
            "",
            1,
            PaymentActor::new("aaaa", PaymentStatus::None),
            PaymentActor::new("bbbb", PaymentStatus::None),
            PaymentAction::new(10, "LBT", "charge", test_time()).unwrap(),
        )
        .unwrap_err();
        match err {
            CommandError::MalformedData(_) => {}
            other => panic!("Expected MalformedData, got {other:?}"),
        }
    }

    #[test]
    fn action_rejects_zero_amount_and_blank_fields() {
        assert!(PaymentAction::new(0, "LBT", "charge", test_time()).is_err());
        assert!(PaymentAction::new(10, " ", "charge", test_time()).is_err());
        assert!(PaymentAction::new(10, "LBT", "", test_time()).is_err());
    }

    #[test]
    fn new_version_links_to_the_previous_revision() {
        let v1 = test_payment();
        let mut v2 = v1.new_version("v2");
        v2.sender.status = PaymentStatus::ReadyForSettlement;

        assert_eq!(v2.reference_id, v1.reference_id);
        assert_eq!(v2.previous_version, Some(Version::from(1)));
        assert_eq!(v2.version(), &Version::from("v2"));
        assert!(v2.validate().is_ok());
    }

    #[test]
    fn a_revision_cannot_supersede_itself() {
        let v1 = test_payment();
        let looped = v1.new_version(1);
        match looped.validate().unwrap_err() {
            CommandError::MalformedData(_) => {}
            other => panic!("Expected MalformedData, got {other:?}"),
        }
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::NeedsKycData).unwrap();
        assert_eq!(json, "\"needs_kyc_data\"");
        assert!(serde_json::from_str::<PaymentStatus>("\"UNKNOWN\"").is_err());
    }
}
