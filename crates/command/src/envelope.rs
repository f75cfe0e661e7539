use serde_json::Value;
use tracing::{debug, warn};

use offchain_core::{CommandError, CommandResult, PartyAddress, RequestCid};

use crate::command::ProtocolCommand;
use crate::mode::{JsonMode, JsonRecord};

const CID_KEY: &str = "cid";
const COMMAND_TYPE_KEY: &str = "command_type";
const COMMAND_KEY: &str = "command";

/// Request envelope carrying one command to the other party.
///
/// The command is always encoded in [`JsonMode::Net`], so the origin never
/// travels in the payload. The receiver attests the origin from the channel
/// the request arrived on (see [`CommandRequest::received_from`]).
///
/// Wire shape:
///
/// ```text
/// { "cid": "<cid>", "command_type": "<type>", "command": { "_reads": ..., "_writes": ..., ... } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest<C> {
    cid: RequestCid,
    command: C,
}

impl<C: ProtocolCommand> CommandRequest<C> {
    /// Wrap `command`, using the cid it suggests.
    pub fn new(command: C) -> CommandResult<Self> {
        let cid = command.request_cid()?;
        Ok(Self { cid, command })
    }

    /// Wrap `command` under an explicitly chosen cid.
    pub fn with_cid(cid: RequestCid, command: C) -> Self {
        Self { cid, command }
    }

    pub fn cid(&self) -> &RequestCid {
        &self.cid
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    pub fn into_command(self) -> C {
        self.command
    }

    pub fn to_net_record(&self) -> CommandResult<JsonRecord> {
        let mut record = JsonRecord::new();
        record.insert(CID_KEY.to_string(), Value::from(self.cid.as_str()));
        record.insert(COMMAND_TYPE_KEY.to_string(), Value::from(C::COMMAND_TYPE));
        record.insert(
            COMMAND_KEY.to_string(),
            Value::Object(self.command.to_json_record(JsonMode::Net)?),
        );
        Ok(record)
    }

    pub fn to_net_json(&self) -> CommandResult<String> {
        Ok(serde_json::to_string(&self.to_net_record()?)?)
    }

    pub fn from_net_record(mut record: JsonRecord) -> CommandResult<Self> {
        let cid = match record.remove(CID_KEY) {
            Some(Value::String(cid)) => RequestCid::new(cid)?,
            _ => return Err(CommandError::malformed("request is missing a string `cid`")),
        };

        match record.remove(COMMAND_TYPE_KEY) {
            Some(Value::String(t)) if t == C::COMMAND_TYPE => {}
            other => {
                warn!(cid = %cid, expected = C::COMMAND_TYPE, found = ?other, "request carries an unexpected command type");
                return Err(CommandError::malformed(format!(
                    "request `{cid}` does not carry a {}",
                    C::COMMAND_TYPE
                )));
            }
        }

        let command = match record.remove(COMMAND_KEY) {
            Some(Value::Object(command)) => C::from_json_record(command, JsonMode::Net)?,
            _ => {
                return Err(CommandError::malformed(format!(
                    "request `{cid}` is missing its `command` object"
                )));
            }
        };

        Ok(Self { cid, command })
    }

    pub fn from_net_json(text: &str) -> CommandResult<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(record) => Self::from_net_record(record),
            _ => Err(CommandError::malformed("request JSON must be an object")),
        }
    }

    /// Parse a request received from `peer` and attest `peer` as the origin
    /// of the carried command.
    pub fn received_from(text: &str, peer: PartyAddress) -> CommandResult<Self> {
        let request = Self::from_net_json(text)?;
        request.command.set_origin(peer)?;
        debug!(cid = %request.cid, command_type = C::COMMAND_TYPE, "received command request");
        Ok(request)
    }
}
