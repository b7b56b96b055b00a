//! Centralized constants for tether.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "tether";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Maximum tokens for a single model response.
pub const MAX_TOKENS: u32 = 1024;

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "tether.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

// --- Anthropic API ---

/// Default base URL for the Anthropic API.
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Beta flag that enables the computer-use tool type.
pub const COMPUTER_USE_BETA: &str = "computer-use-2024-10-22";

/// Tool type string for the desktop control tool.
pub const COMPUTER_TOOL_TYPE: &str = "computer_20241022";

// --- Conversation ---

/// Shown and recorded when a model response carries no text block.
pub const NO_RESPONSE_TEXT: &str = "No response text available";

/// Longest block preview printed by the `log` directive.
pub const LOG_PREVIEW_MAX_CHARS: usize = 180;

/// Default system preamble. `{datetime}` is replaced with the local time
/// when a session starts.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant that can use tools to get information, solve problems, and perform \
other tasks for people. If someone talks to you, you solve their problem with your tools and \
knowledge as you see fit.

Additional instructions for the computer tool:
* The computer is running an Ubuntu Linux graphical desktop environment.
* You have 'sudo' privileges.
* Use Firefox as your web browser. There is an icon for it in the bottom taskbar.
* Use Konsole as your terminal emulator. There is an icon for it in the bottom taskbar.
* You may install additional software packages with the terminal and the 'apt' command.
* Make sure you know where the cursor is before clicking. Examine the screen and the cursor to \
understand what a click will do.
* Predict where typed text will land. You may need to click a window or input box to give it \
focus before typing, for example the browser's address bar before entering a URL.

The current time and date is {datetime}. Use it when performing tasks: if you are asked about \
events after your training data, check whether your tools can find the answer before declining.";

// --- Remote desktop ---

/// Default X display number targeted on the remote host.
pub const DEFAULT_DISPLAY_NUMBER: u32 = 0;

/// Default display width declared to the model, in pixels.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 1600;

/// Default display height declared to the model, in pixels.
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 1200;

/// Delay between synthesized keystrokes for the `type` action.
pub const DEFAULT_TYPE_DELAY_MS: u64 = 100;

/// Largest stdout a remote command may produce (50 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 50 * 1024 * 1024;

/// Where the remote host writes the screenshot before encoding it.
pub const DEFAULT_SCREENSHOT_PATH: &str = "/tmp/tether-screenshot.png";

/// Environment variable naming the SSH host of the remote desktop.
pub const SSH_HOST_ENV: &str = "COMPUTER_USE_SSH_HOST";

// --- Weather ---

/// Default base URL for WeatherAPI.
pub const WEATHER_API_BASE: &str = "https://api.weatherapi.com";

/// Environment variable holding the WeatherAPI key.
pub const WEATHER_API_KEY_ENV: &str = "WEATHERAPI_API_KEY";
