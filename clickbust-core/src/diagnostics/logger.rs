//! Hierarchical, dotted-name loggers.
//!
//! Loggers form a tree rooted at an anonymous root. Looking up `a.b.c`
//! creates `a`, `a.b` and `a.b.c` as needed, and the same name always
//! resolves to the same node. A logger without its own level uses the level
//! of its nearest ancestor that has one; a tree with no level anywhere is a
//! configuration error that is reported on the first query.
//!
//! ```
//! use std::rc::Rc;
//! use clickbust_core::diagnostics::{Level, LogManager, MemoryHandler};
//!
//! let logs = LogManager::new();
//! logs.set_level(logs.root(), Some(Level::INFO)).unwrap();
//! let buffer = Rc::new(MemoryHandler::new());
//! logs.add_handler(logs.root(), buffer.clone()).unwrap();
//!
//! let logger = logs.get_logger("app.net");
//! logs.info(logger, "connected").unwrap();
//! logs.fine(logger, "dropped").unwrap();
//! assert_eq!(buffer.messages(), vec!["connected"]);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::error::{DiagnosticsError, ErrorContext};
use super::handler::LogHandler;
use super::level::Level;
use super::record::LogRecord;
use crate::clock::{Clock, SystemClock};

/// Handle to a logger node owned by a [`LogManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoggerId(usize);

/// Handle to a handler registration, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct LoggerNode {
    name: String,
    level: Option<Level>,
    parent: Option<LoggerId>,
    children: BTreeMap<String, LoggerId>,
    handlers: Vec<(HandlerId, Rc<dyn LogHandler>)>,
}

impl LoggerNode {
    fn new(name: String, parent: Option<LoggerId>) -> Self {
        Self {
            name,
            level: None,
            parent,
            children: BTreeMap::new(),
            handlers: Vec::new(),
        }
    }
}

/// Owner of a logger tree.
pub struct LogManager {
    nodes: RefCell<Vec<LoggerNode>>,
    sequence: Cell<u64>,
    next_handler: Cell<u64>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("loggers", &self.nodes.borrow().len())
            .field("sequence", &self.sequence.get())
            .finish_non_exhaustive()
    }
}

impl LogManager {
    /// Create a tree containing only the root, timestamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// Create a tree whose records are timestamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            nodes: RefCell::new(vec![LoggerNode::new(String::new(), None)]),
            sequence: Cell::new(0),
            next_handler: Cell::new(0),
            clock,
        }
    }

    /// The anonymous root logger.
    #[must_use]
    pub const fn root(&self) -> LoggerId {
        LoggerId(0)
    }

    /// Find or create the logger for a dotted name, creating missing ancestors.
    ///
    /// The empty name is the root. Empty segments are skipped, so `.a`,
    /// `a.` and `a` name the same logger.
    pub fn get_logger(&self, name: &str) -> LoggerId {
        let mut current = self.root();
        let mut nodes = self.nodes.borrow_mut();
        let mut path = String::new();
        for segment in name.split('.').filter(|segment| !segment.is_empty()) {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
            let existing = nodes[current.0].children.get(segment).copied();
            current = match existing {
                Some(child) => child,
                None => {
                    let child = LoggerId(nodes.len());
                    nodes.push(LoggerNode::new(path.clone(), Some(current)));
                    nodes[current.0].children.insert(segment.to_string(), child);
                    child
                }
            };
        }
        current
    }

    /// Number of loggers in the tree, root included.
    #[must_use]
    pub fn logger_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Full dotted name of a logger.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn name(&self, id: LoggerId) -> Result<String, DiagnosticsError> {
        self.with_node(id, |node| node.name.clone())
    }

    /// Parent of a logger; `None` for the root.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn parent(&self, id: LoggerId) -> Result<Option<LoggerId>, DiagnosticsError> {
        self.with_node(id, |node| node.parent)
    }

    /// Direct children of a logger, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn children(&self, id: LoggerId) -> Result<Vec<LoggerId>, DiagnosticsError> {
        self.with_node(id, |node| node.children.values().copied().collect())
    }

    /// Set or clear a logger's own level.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn set_level(&self, id: LoggerId, level: Option<Level>) -> Result<(), DiagnosticsError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .get_mut(id.0)
            .ok_or(DiagnosticsError::UnknownLogger(id.0))?;
        node.level = level;
        Ok(())
    }

    /// The logger's own level, if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn level(&self, id: LoggerId) -> Result<Option<Level>, DiagnosticsError> {
        self.with_node(id, |node| node.level)
    }

    /// The nearest level set on the logger or one of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::NoLevelConfigured`] when no level is set
    /// anywhere on the path to the root.
    pub fn effective_level(&self, id: LoggerId) -> Result<Level, DiagnosticsError> {
        let nodes = self.nodes.borrow();
        let start = nodes.get(id.0).ok_or(DiagnosticsError::UnknownLogger(id.0))?;
        let mut current = Some(id);
        while let Some(LoggerId(index)) = current {
            let node = &nodes[index];
            if let Some(level) = node.level {
                return Ok(level);
            }
            current = node.parent;
        }
        Err(DiagnosticsError::NoLevelConfigured {
            logger: start.name.clone(),
        })
    }

    /// Whether a message at `level` would be published by this logger.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::effective_level`] errors.
    pub fn is_loggable(&self, id: LoggerId, level: Level) -> Result<bool, DiagnosticsError> {
        let threshold = self.effective_level(id)?;
        Ok(threshold != Level::OFF && level >= threshold)
    }

    /// Attach a handler to a logger.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn add_handler(
        &self,
        id: LoggerId,
        handler: Rc<dyn LogHandler>,
    ) -> Result<HandlerId, DiagnosticsError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .get_mut(id.0)
            .ok_or(DiagnosticsError::UnknownLogger(id.0))?;
        let handler_id = HandlerId(self.next_handler.get());
        self.next_handler.set(handler_id.0 + 1);
        node.handlers.push((handler_id, handler));
        Ok(handler_id)
    }

    /// Detach one handler. Returns whether it was attached to this logger.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::UnknownLogger`] for a foreign id.
    pub fn remove_handler(
        &self,
        id: LoggerId,
        handler: HandlerId,
    ) -> Result<bool, DiagnosticsError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .get_mut(id.0)
            .ok_or(DiagnosticsError::UnknownLogger(id.0))?;
        let before = node.handlers.len();
        node.handlers.retain(|(existing, _)| *existing != handler);
        Ok(node.handlers.len() != before)
    }

    /// Log a message, returning whether it passed the level check.
    ///
    /// Passing records go to the logger's own handlers, then to each
    /// ancestor's handlers up to the root.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::NoLevelConfigured`] when the tree has no
    /// level to compare against.
    pub fn log(
        &self,
        id: LoggerId,
        level: Level,
        message: impl Into<String>,
        error: Option<&ErrorContext>,
    ) -> Result<bool, DiagnosticsError> {
        if !self.is_loggable(id, level)? {
            return Ok(false);
        }

        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);

        // Collect first so handlers may use the manager while publishing.
        let (logger_name, handlers) = {
            let nodes = self.nodes.borrow();
            let mut handlers: Vec<Rc<dyn LogHandler>> = Vec::new();
            let mut current = Some(id);
            while let Some(LoggerId(index)) = current {
                let node = &nodes[index];
                handlers.extend(node.handlers.iter().map(|(_, h)| Rc::clone(h)));
                current = node.parent;
            }
            (nodes[id.0].name.clone(), handlers)
        };

        let record = LogRecord {
            level,
            logger_name,
            message: message.into(),
            sequence,
            timestamp_ms: self.clock.now_ms(),
            error: error.cloned(),
        };
        for handler in &handlers {
            handler.publish(&record);
        }
        Ok(true)
    }

    /// Log at [`Level::SHOUT`].
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn shout(&self, id: LoggerId, message: impl Into<String>) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::SHOUT, message, None)
    }

    /// Log at [`Level::SEVERE`], optionally with an error.
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn severe(
        &self,
        id: LoggerId,
        message: impl Into<String>,
        error: Option<&ErrorContext>,
    ) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::SEVERE, message, error)
    }

    /// Log at [`Level::WARNING`], optionally with an error.
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn warning(
        &self,
        id: LoggerId,
        message: impl Into<String>,
        error: Option<&ErrorContext>,
    ) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::WARNING, message, error)
    }

    /// Log at [`Level::INFO`].
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn info(&self, id: LoggerId, message: impl Into<String>) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::INFO, message, None)
    }

    /// Log at [`Level::CONFIG`].
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn config(&self, id: LoggerId, message: impl Into<String>) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::CONFIG, message, None)
    }

    /// Log at [`Level::FINE`].
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn fine(&self, id: LoggerId, message: impl Into<String>) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::FINE, message, None)
    }

    /// Log at [`Level::FINER`].
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn finer(&self, id: LoggerId, message: impl Into<String>) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::FINER, message, None)
    }

    /// Log at [`Level::FINEST`].
    ///
    /// # Errors
    ///
    /// See [`Self::log`].
    pub fn finest(&self, id: LoggerId, message: impl Into<String>) -> Result<bool, DiagnosticsError> {
        self.log(id, Level::FINEST, message, None)
    }

    fn with_node<T>(
        &self,
        id: LoggerId,
        f: impl FnOnce(&LoggerNode) -> T,
    ) -> Result<T, DiagnosticsError> {
        self.nodes
            .borrow()
            .get(id.0)
            .map(f)
            .ok_or(DiagnosticsError::UnknownLogger(id.0))
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
