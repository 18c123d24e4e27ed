//! Message handlers and the per-connection handler registry.

use crate::connection::Connection;
use crate::error::ConnectionError;
use hlnet_protocol::{CodecError, Message, MsgKind, Reader};
use std::collections::HashMap;
use std::rc::Rc;

/// A received frame on its way to a handler.
pub struct NetworkMessage<'a> {
    pub kind: MsgKind,
    pub channel_id: u8,
    /// Reader positioned at the start of the payload.
    pub reader: Reader,
    pub conn: &'a mut Connection,
}

impl NetworkMessage<'_> {
    pub fn read_message<M: Message>(&mut self) -> Result<M, CodecError> {
        self.reader.read_message()
    }
}

/// A callback for one message kind.
///
/// Handlers are shared so the registry can hand one out while the
/// connection itself is lent to the call.
pub type Handler = Rc<dyn Fn(&mut NetworkMessage<'_>) -> Result<(), ConnectionError>>;

/// Maps message kinds to handlers.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MsgKind, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: MsgKind, handler: F)
    where
        F: Fn(&mut NetworkMessage<'_>) -> Result<(), ConnectionError> + 'static,
    {
        self.handlers.insert(kind, Rc::new(handler));
    }

    /// Registers a handler that receives the decoded message.
    pub fn register_message<M, F>(&mut self, kind: MsgKind, handler: F)
    where
        M: Message + 'static,
        F: Fn(&mut Connection, M) -> Result<(), ConnectionError> + 'static,
    {
        self.register(kind, move |net| {
            let message = net.read_message::<M>()?;
            handler(net.conn, message)
        });
    }

    pub fn unregister(&mut self, kind: MsgKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn get(&self, kind: MsgKind) -> Option<Handler> {
        self.handlers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: MsgKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = MsgKind> + '_ {
        self.handlers.keys().copied()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_replace_unregister() {
        let mut registry = HandlerRegistry::new();
        registry.register(MsgKind::Ready, |_| Ok(()));
        registry.register(MsgKind::Ready, |_| Ok(()));
        registry.register(MsgKind::User(100), |_| Ok(()));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(MsgKind::Ready));

        assert!(registry.unregister(MsgKind::Ready));
        assert!(!registry.unregister(MsgKind::Ready));
        assert!(registry.get(MsgKind::Ready).is_none());
        assert!(registry.get(MsgKind::User(100)).is_some());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_debug_lists_sorted_kinds() {
        let mut registry = HandlerRegistry::new();
        registry.register(MsgKind::User(60), |_| Ok(()));
        registry.register(MsgKind::Connect, |_| Ok(()));
        let text = format!("{:?}", registry);
        assert!(text.find("Connect").unwrap() < text.find("User(60)").unwrap());
    }
}
