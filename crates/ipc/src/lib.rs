//! IPC message protocol for Lightbake
//!
//! Defines the commands a caller sends to the lightmap service and the events
//! it answers with. Messages are JSON with a `type` tag and a `data` payload.

mod commands;
mod error;
mod messages;
mod types;

pub use commands::*;
pub use error::*;
pub use messages::*;
pub use types::*;

/// Encode a command as JSON.
pub fn encode_command(command: &LightmapCommand) -> Result<String, IpcError> {
    Ok(serde_json::to_string(command)?)
}

/// Decode a command from JSON.
pub fn decode_command(json: &str) -> Result<LightmapCommand, IpcError> {
    if json.trim().is_empty() {
        return Err(IpcError::InvalidFormat("empty message".to_string()));
    }
    Ok(serde_json::from_str(json)?)
}

/// Encode an event as JSON.
pub fn encode_event(event: &LightmapEvent) -> Result<String, IpcError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode an event from JSON.
pub fn decode_event(json: &str) -> Result<LightmapEvent, IpcError> {
    if json.trim().is_empty() {
        return Err(IpcError::InvalidFormat("empty message".to_string()));
    }
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use lightbake_config::{GroupingPolicy, LightmapConfig};

    use super::*;

    #[test]
    fn test_command_wire_format() {
        let command = LightmapCommand::Clear(ClearCommand {
            lightmap_id: "lightmap_0001".into(),
        });
        let json = encode_command(&command).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Clear","data":{"lightmap_id":"lightmap_0001"}}"#
        );
    }

    #[test]
    fn test_unit_command() {
        let json = encode_command(&LightmapCommand::ListLightmaps).unwrap();
        assert_eq!(json, r#"{"type":"ListLightmaps"}"#);
        assert_eq!(decode_command(&json).unwrap(), LightmapCommand::ListLightmaps);
    }

    #[test]
    fn test_generate_with_partial_config() {
        let json = r#"{
            "type": "Generate",
            "data": {
                "object_ids": [3, 4],
                "config": { "grouping": { "policy": "manual" } }
            }
        }"#;
        let LightmapCommand::Generate(command) = decode_command(json).unwrap() else {
            panic!("expected generate command");
        };
        assert_eq!(command.object_ids, vec![3, 4]);
        let config = command.config.unwrap();
        assert_eq!(config.grouping.policy, GroupingPolicy::Manual);
        assert_eq!(config.bake, LightmapConfig::default().bake);
    }

    #[test]
    fn test_generate_without_config() {
        let json = r#"{"type":"Generate","data":{"object_ids":[1]}}"#;
        let LightmapCommand::Generate(command) = decode_command(json).unwrap() else {
            panic!("expected generate command");
        };
        assert!(command.config.is_none());
    }

    #[test]
    fn test_event_wire_format() {
        let event = LightmapEvent::ViewChanged {
            view: ViewKind::Baked,
            changed: true,
            materials: 2,
            lights: 1,
        };
        let json = encode_event(&event).unwrap();
        assert!(json.starts_with(r#"{"type":"ViewChanged","data":{"view":"Baked""#));
        assert_eq!(decode_event(&json).unwrap(), event);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_command("  "), Err(IpcError::InvalidFormat(_))));
        assert!(matches!(
            decode_command(r#"{"type":"Explode"}"#),
            Err(IpcError::Serialize(_))
        ));
    }
}
