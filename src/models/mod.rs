pub mod contact;
pub mod conversation;
pub mod message;

pub use message::{Attachment, Message, MessageType};
