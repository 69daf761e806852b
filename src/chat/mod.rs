// file: src/chat/mod.rs
// description: chat orchestration module exports
// reference: internal module structure

pub mod service;
pub mod tool_loop;

pub use service::{
    Attachment, ChatReply, ChatService, ReplyMetadata, WorklogDocument, detect_attachment,
    generate_worklog,
};
pub use tool_loop::{LoopOutcome, ToolLoop};
