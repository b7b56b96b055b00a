//! Computer tool: drives the remote desktop through `xdotool` and `scrot`.
//!
//! Each action maps to exactly one command on the [`RemoteExecutor`]. Actions
//! with no data (moves, clicks, keys, typing) answer with an empty result;
//! `screenshot` answers with a PNG image block and `cursor_position` with the
//! pointer coordinates.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{Tool, ToolDescriptor, ToolError, ToolOutput};
use crate::config::RemoteConfig;
use crate::constants::COMPUTER_TOOL_TYPE;
use crate::message::ImageSource;
use crate::remote::RemoteExecutor;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Validated input for the computer tool.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ComputerAction {
    Screenshot,
    CursorPosition,
    MouseMove { coordinate: [u32; 2] },
    LeftClick,
    MiddleClick,
    RightClick,
    DoubleClick,
    Key { text: String },
    Type { text: String },
}

/// X11 pointer button numbers.
#[derive(Debug, Clone, Copy)]
enum MouseButton {
    Left = 1,
    Middle = 2,
    Right = 3,
}

/// Tool that controls one remote display.
pub struct ComputerTool {
    executor: Arc<dyn RemoteExecutor>,
    remote: RemoteConfig,
}

impl ComputerTool {
    pub fn new(executor: Arc<dyn RemoteExecutor>, remote: RemoteConfig) -> Self {
        Self { executor, remote }
    }

    /// The single remote command for `action`.
    fn command_for(&self, action: &ComputerAction) -> Result<String, ToolError> {
        let command = match action {
            ComputerAction::Screenshot => {
                let path = quote(&self.remote.screenshot_path)?;
                format!("scrot -o {path} && base64 -w 0 {path}")
            }
            ComputerAction::CursorPosition => "xdotool getmouselocation --shell".to_string(),
            ComputerAction::MouseMove { coordinate: [x, y] } => {
                if *x >= self.remote.display_width || *y >= self.remote.display_height {
                    return Err(ToolError::InvalidInput(format!(
                        "coordinate ({x}, {y}) is outside the {}x{} display",
                        self.remote.display_width, self.remote.display_height
                    )));
                }
                format!("xdotool mousemove --sync {x} {y}")
            }
            ComputerAction::LeftClick => click(MouseButton::Left),
            ComputerAction::MiddleClick => click(MouseButton::Middle),
            ComputerAction::RightClick => click(MouseButton::Right),
            ComputerAction::DoubleClick => {
                let button = MouseButton::Left as u8;
                format!("xdotool click {button} click {button}")
            }
            ComputerAction::Key { text } => {
                let keys = text
                    .split_whitespace()
                    .map(quote)
                    .collect::<Result<Vec<_>, _>>()?;
                if keys.is_empty() {
                    return Err(ToolError::InvalidInput("`text` names no key".to_string()));
                }
                format!("xdotool key -- {}", keys.join(" "))
            }
            ComputerAction::Type { text } => {
                if text.is_empty() {
                    return Err(ToolError::InvalidInput("`text` is empty".to_string()));
                }
                format!(
                    "xdotool type --delay {} -- {}",
                    self.remote.type_delay_ms,
                    quote(text)?
                )
            }
        };
        Ok(command)
    }
}

fn click(button: MouseButton) -> String {
    format!("xdotool click {}", button as u8)
}

/// Quotes `text` for the remote shell.
fn quote(text: &str) -> Result<String, ToolError> {
    shlex::try_quote(text)
        .map(|q| q.into_owned())
        .map_err(|_| ToolError::InvalidInput("text contains a NUL byte".to_string()))
}

/// Parses `xdotool getmouselocation --shell` output.
fn parse_mouse_location(output: &str) -> Result<(i64, i64), ToolError> {
    let mut x = None;
    let mut y = None;
    for line in output.lines() {
        match line.trim().split_once('=') {
            Some(("X", v)) => x = v.parse().ok(),
            Some(("Y", v)) => y = v.parse().ok(),
            _ => {}
        }
    }
    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ToolError::UnexpectedOutput(format!(
            "could not read pointer location from {output:?}"
        ))),
    }
}

/// Decodes the base64 screenshot and checks it is a PNG.
fn decode_png(encoded: &str) -> Result<Vec<u8>, ToolError> {
    if encoded.is_empty() {
        return Err(ToolError::UnexpectedOutput("screenshot was empty".to_string()));
    }
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ToolError::UnexpectedOutput(format!("screenshot is not base64: {e}")))?;
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(ToolError::UnexpectedOutput(
            "screenshot is not a PNG image".to_string(),
        ));
    }
    Ok(bytes)
}

#[async_trait::async_trait]
impl Tool for ComputerTool {
    fn name(&self) -> &str {
        "computer"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::Computer {
            kind: COMPUTER_TOOL_TYPE.to_string(),
            name: self.name().to_string(),
            display_width_px: self.remote.display_width,
            display_height_px: self.remote.display_height,
            display_number: self.remote.display_number,
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let action: ComputerAction = serde_json::from_value(input).map_err(ToolError::invalid)?;
        let command = self.command_for(&action)?;
        let output = self.executor.exec(&command).await?;

        match action {
            ComputerAction::Screenshot => {
                let png = decode_png(&output)?;
                tracing::debug!(bytes = png.len(), "captured screenshot");
                Ok(ToolOutput::Image(ImageSource::png(png)))
            }
            ComputerAction::CursorPosition => {
                let (x, y) = parse_mouse_location(&output)?;
                Ok(ToolOutput::Text(format!("X={x},Y={y}")))
            }
            _ => Ok(ToolOutput::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NeverCalled;

    #[async_trait::async_trait]
    impl RemoteExecutor for NeverCalled {
        async fn exec(&self, command: &str) -> Result<String, crate::remote::ExecError> {
            panic!("unexpected remote command: {command}");
        }
    }

    fn tool() -> ComputerTool {
        ComputerTool::new(Arc::new(NeverCalled), RemoteConfig::default())
    }

    fn command(input: Value) -> Result<String, ToolError> {
        let action: ComputerAction = serde_json::from_value(input).unwrap();
        tool().command_for(&action)
    }

    #[test]
    fn test_action_commands() {
        assert_eq!(
            command(json!({"action": "mouse_move", "coordinate": [100, 200]})).unwrap(),
            "xdotool mousemove --sync 100 200"
        );
        assert_eq!(command(json!({"action": "left_click"})).unwrap(), "xdotool click 1");
        assert_eq!(command(json!({"action": "middle_click"})).unwrap(), "xdotool click 2");
        assert_eq!(command(json!({"action": "right_click"})).unwrap(), "xdotool click 3");
        assert_eq!(
            command(json!({"action": "double_click"})).unwrap(),
            "xdotool click 1 click 1"
        );
        assert_eq!(
            command(json!({"action": "cursor_position"})).unwrap(),
            "xdotool getmouselocation --shell"
        );
        assert_eq!(
            command(json!({"action": "screenshot"})).unwrap(),
            "scrot -o /tmp/tether-screenshot.png && base64 -w 0 /tmp/tether-screenshot.png"
        );
    }

    /// Words the remote shell sees after `prefix`.
    fn shell_words(command: &str, prefix: &str) -> Vec<String> {
        let rest = command
            .strip_prefix(prefix)
            .unwrap_or_else(|| panic!("{command:?} does not start with {prefix:?}"));
        shlex::split(rest).unwrap()
    }

    #[test]
    fn test_key_chords_are_quoted_separately() {
        let cmd = command(json!({"action": "key", "text": "ctrl+l"})).unwrap();
        assert_eq!(shell_words(&cmd, "xdotool key -- "), vec!["ctrl+l"]);

        let cmd = command(json!({"action": "key", "text": "ctrl+a  Delete"})).unwrap();
        assert_eq!(shell_words(&cmd, "xdotool key -- "), vec!["ctrl+a", "Delete"]);

        let cmd = command(json!({"action": "key", "text": "Return ;reboot $(id)"})).unwrap();
        assert_eq!(
            shell_words(&cmd, "xdotool key -- "),
            vec!["Return", ";reboot", "$(id)"]
        );

        assert!(command(json!({"action": "key", "text": "   "})).is_err());
    }

    #[test]
    fn test_type_text_is_shell_quoted() {
        let cmd = command(json!({"action": "type", "text": "it's $HOME"})).unwrap();
        assert_eq!(
            shell_words(&cmd, "xdotool type --delay 100 -- "),
            vec!["it's $HOME"]
        );

        let cmd = command(json!({"action": "type", "text": "a\"b`c` && d"})).unwrap();
        assert_eq!(
            shell_words(&cmd, "xdotool type --delay 100 -- "),
            vec!["a\"b`c` && d"]
        );
    }

    #[test]
    fn test_type_rejects_nul_byte() {
        let err = command(json!({"action": "type", "text": "a\0b"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_mouse_move_outside_display_is_rejected() {
        let err = command(json!({"action": "mouse_move", "coordinate": [1600, 10]})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_actions_fail_to_parse() {
        assert!(serde_json::from_value::<ComputerAction>(json!({"action": "mouse_move"})).is_err());
        assert!(serde_json::from_value::<ComputerAction>(json!({"action": "key"})).is_err());
        assert!(serde_json::from_value::<ComputerAction>(json!({"action": "left_click_drag"})).is_err());
        assert!(serde_json::from_value::<ComputerAction>(
            json!({"action": "mouse_move", "coordinate": [-1, 5]})
        )
        .is_err());
    }

    #[test]
    fn test_parse_mouse_location() {
        let output = "X=812\nY=433\nSCREEN=0\nWINDOW=60817412";
        assert_eq!(parse_mouse_location(output).unwrap(), (812, 433));
        assert!(parse_mouse_location("x:1 y:2").is_err());
    }

    #[test]
    fn test_decode_png() {
        let png = [PNG_SIGNATURE.as_slice(), &[1, 2, 3]].concat();
        let encoded = STANDARD.encode(&png);
        assert_eq!(decode_png(&encoded).unwrap(), png);

        assert!(decode_png("").is_err());
        assert!(decode_png("not base64!").is_err());
        assert!(decode_png(&STANDARD.encode(b"GIF89a")).is_err());
    }

    #[test]
    fn test_descriptor_matches_display() {
        let remote = RemoteConfig {
            display_number: 2,
            display_width: 1024,
            display_height: 768,
            ..RemoteConfig::default()
        };
        let tool = ComputerTool::new(Arc::new(NeverCalled), remote);
        assert_eq!(
            serde_json::to_value(tool.descriptor()).unwrap(),
            json!({
                "type": "computer_20241022",
                "name": "computer",
                "display_width_px": 1024,
                "display_height_px": 768,
                "display_number": 2
            })
        );
    }
}
