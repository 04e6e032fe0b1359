//! Rendering seam.
//!
//! The pipeline pushes every [`Message`] it produces through a
//! [`Presenter`]. What happens next (terminal output, JSON lines, a web page)
//! is none of its business.

use crate::message::Message;

/// Receives the messages of a pipeline run, in order.
///
/// A run calls `present` once with `info`, or with `progress` followed by
/// exactly one terminal message.
pub trait Presenter: Send + Sync {
    /// Shows `message`, replacing whatever was shown before.
    fn present(&self, message: &Message);
}

impl<F> Presenter for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn present(&self, message: &Message) {
        self(message)
    }
}
