mod chat;
mod session;

pub use {
    chat::*,
    session::*,
};
