use tracing::warn;

use offchain_command::{
    CommandBase, Dependencies, JsonMode, JsonRecord, ObjectRef, ProtocolCommand, VersionMap,
};
use offchain_core::{CommandError, CommandResult, ObjectId, Version};

use crate::payment::PaymentObject;

/// Command: propose a new revision of a payment.
///
/// Writes `(reference_id, payment.version)`. When the payment supersedes an
/// earlier revision it also reads `(reference_id, previous_version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCommand {
    base: CommandBase,
    payment: PaymentObject,
}

impl PaymentCommand {
    /// Payload key holding the serialized payment.
    pub const PAYLOAD_KEY: &'static str = "payment";

    pub fn new(payment: PaymentObject) -> CommandResult<Self> {
        payment.validate()?;
        let object_id = payment.reference_id.clone();

        let reads = VersionMap::from_refs(
            payment
                .previous_version
                .clone()
                .map(|prev| ObjectRef::new(object_id.clone(), prev)),
        )?;
        let writes = VersionMap::from_refs([ObjectRef::new(object_id, payment.version.clone())])?;

        Ok(Self {
            base: CommandBase::new(reads, writes),
            payment,
        })
    }

    pub fn payment(&self) -> &PaymentObject {
        &self.payment
    }
}

impl ProtocolCommand for PaymentCommand {
    type Object = PaymentObject;
    const COMMAND_TYPE: &'static str = "PaymentCommand";

    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn materialize(
        &self,
        _version: &Version,
        dependencies: &Dependencies<PaymentObject>,
    ) -> CommandResult<PaymentObject> {
        if let Some(prev) = &self.payment.previous_version {
            // Looked up by this payment's own id, so a revision of another
            // payment can never stand in for the predecessor.
            dependencies
                .get(&self.payment.reference_id, prev)
                .ok_or_else(|| CommandError::missing_dependency(prev.clone()))?;
        }
        Ok(self.payment.clone())
    }

    fn write_payload(&self, record: &mut JsonRecord, _mode: JsonMode) -> CommandResult<()> {
        record.insert(
            Self::PAYLOAD_KEY.to_string(),
            serde_json::to_value(&self.payment)?,
        );
        Ok(())
    }

    fn from_payload(base: CommandBase, mut payload: JsonRecord, _mode: JsonMode) -> CommandResult<Self> {
        let value = payload
            .remove(Self::PAYLOAD_KEY)
            .ok_or_else(|| CommandError::malformed("payment command is missing `payment`"))?;
        let payment: PaymentObject = serde_json::from_value(value)?;
        payment.validate()?;

        let cmd = Self { base, payment };

        // The version maps must describe the carried payment, not some other object.
        let object_id = &cmd.payment.reference_id;
        let expected_read = cmd.payment.previous_version.as_ref();
        if cmd.base.writes().len() != 1
            || cmd.base.writes().get(object_id) != Some(&cmd.payment.version)
            || cmd.base.reads().len() != usize::from(expected_read.is_some())
            || cmd.base.reads().get(object_id) != expected_read
        {
            warn!(reference_id = %cmd.payment.reference_id, "payment command version maps do not match its payment");
            return Err(CommandError::malformed(format!(
                "version maps of payment command `{}` do not match its payment",
                cmd.payment.reference_id
            )));
        }

        Ok(cmd)
    }
}
