//! Parsers for Claude Code configuration files

pub mod frontmatter;
pub mod mcp;
pub mod settings;

pub use frontmatter::{parse_agent, parse_command, parse_skill, split_tool_list};
pub use mcp::{parse_mcp_config, parse_user_mcp};
pub use settings::{parse_hooks, parse_settings};
