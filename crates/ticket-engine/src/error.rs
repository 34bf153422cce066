use thiserror::Error;

/// Comprehensive error types for ticketing operations
///
/// This enum covers all possible error conditions that can occur while issuing,
/// queuing, calling, and completing tickets, from repository failures to
/// lifecycle rule violations.
///
/// # Examples
///
/// ```
/// use queuehub_ticket_engine::{TicketingError, Result};
///
/// fn call_ticket() -> Result<()> {
///     // Simulate a lifecycle violation
///     Err(TicketingError::invalid_transition("Cannot call a completed ticket"))
/// }
///
/// match call_ticket() {
///     Ok(_) => println!("Ticket called successfully"),
///     Err(TicketingError::InvalidTransition(msg)) => println!("Lifecycle error: {}", msg),
///     Err(e) => println!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum TicketingError {
    /// Resource not found errors
    ///
    /// Requested tickets, branches, services, or staff could not be located.
    ///
    /// # Examples
    /// - Ticket id not found
    /// - Branch id not registered in the directory
    /// - Ticket number never issued
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ticket lifecycle violations
    ///
    /// A status change was requested outside the legal transition table.
    /// The ticket is left untouched when this error is returned.
    ///
    /// # Examples
    /// - Completing an already-completed ticket
    /// - Serving a cancelled ticket
    /// - Transferring a ticket that has already been called
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Invalid input validation errors
    ///
    /// Caller-provided data failed validation checks, including reference
    /// checks against the directory and business rule violations.
    ///
    /// # Examples
    /// - Unknown branch or service id on creation
    /// - Priority below 1
    /// - Staff member already serving another ticket
    #[error("Validation error: {0}")]
    Validation(String),

    /// Concurrent update conflicts
    ///
    /// Two updates raced on the same ticket and this one lost; the winning
    /// update is already committed. The caller may re-read and retry.
    ///
    /// # Examples
    /// - Two staff members calling the same ticket
    /// - A cancel racing a complete
    #[error("Concurrency conflict: {0}")]
    Conflict(String),

    /// Database operation errors
    ///
    /// Includes connection failures, SQL errors, and data consistency
    /// issues with the SQLite store.
    ///
    /// # Examples
    /// - Connection timeout
    /// - SQL syntax errors
    /// - Database file corruption
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration validation and parsing errors
    ///
    /// Problems with engine configuration, including invalid values and
    /// missing required settings.
    ///
    /// # Examples
    /// - Empty database path
    /// - Zero default service duration
    /// - Unparseable bind address
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal system errors
    ///
    /// Unexpected internal errors that indicate bugs or corrupted state.
    /// These should be logged and investigated.
    ///
    /// # Examples
    /// - Invalid internal state
    /// - Poisoned shared structures
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for TicketingError {
    fn from(err: anyhow::Error) -> Self {
        // Map anyhow errors to Internal by default, as they are usually
        // unexpected errors from lower-level components.
        Self::Internal(err.to_string())
    }
}

impl TicketingError {
    /// Create a new NotFound error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::not_found("Ticket 'a1b2c3' not found");
    /// println!("{}", error);  // Prints: Not found: Ticket 'a1b2c3' not found
    /// ```
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidTransition error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::invalid_transition("completed -> serving is not allowed");
    /// println!("{}", error);
    /// ```
    pub fn invalid_transition<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create a new Validation error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::validation("Branch 'b-99' does not exist");
    /// println!("{}", error);
    /// ```
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Conflict error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::conflict("Ticket was updated by another staff member");
    /// println!("{}", error);
    /// ```
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new Database error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::database("Connection to database failed");
    /// println!("{}", error);
    /// ```
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Configuration error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::configuration("default_service_minutes must be greater than 0");
    /// println!("{}", error);
    /// ```
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new Internal error with the provided message
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// let error = TicketingError::internal("Unexpected state in ticket processing");
    /// println!("{}", error);
    /// ```
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether retrying the operation after a fresh read can succeed
    ///
    /// Conflicts are transient by nature; everything else requires the
    /// caller to change its input or fix the deployment.
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::TicketingError;
    ///
    /// assert!(TicketingError::conflict("lost the race").is_recoverable());
    /// assert!(!TicketingError::validation("bad branch id").is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result type for ticketing operations
///
/// This is a type alias for `std::result::Result<T, TicketingError>` that simplifies
/// error handling throughout the ticketing codebase.
///
/// # Examples
///
/// ```
/// use queuehub_ticket_engine::{Result, TicketingError};
///
/// fn validate_priority(priority: i32) -> Result<i32> {
///     if priority < 1 {
///         return Err(TicketingError::Validation("Priority must be at least 1".to_string()));
///     }
///     Ok(priority)
/// }
///
/// match validate_priority(0) {
///     Ok(p) => println!("Priority accepted: {}", p),
///     Err(e) => eprintln!("Rejected: {}", e),
/// }
/// ```
pub type Result<T> = std::result::Result<T, TicketingError>;
