//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Proxy server defaults
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_POOL_SIZE: u32 = 4;

// Upstream endpoints
pub const DEFAULT_CLASSROOM_BASE_URL: &str = "https://classroom.googleapis.com";
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://ustep.ustp.edu.ph";
pub const DEFAULT_PORTAL_SERVICE: &str = "moodle_mobile_app";

// Normalization
pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const CLASSROOM_DESCRIPTION_MAX_CHARS: usize = 150;
pub const TRUNCATE_SUFFIX: &str = "...";
pub const CANVAS_UNKNOWN_COURSE: &str = "Unknown Course";
pub const PORTAL_UNKNOWN_COURSE: &str = "USTeP Course";
pub const UNASSIGNED_COURSE: &str = "Uncategorized";

// Paging
pub const CANVAS_PAGE_SIZE: u32 = 100;
pub const CLASSROOM_COURSE_PAGE_SIZE: u32 = 20;
pub const CLASSROOM_COURSEWORK_PAGE_SIZE: u32 = 100;

// Views
pub const DEFAULT_UPCOMING_WINDOW_DAYS: i64 = 30;
pub const ARCHIVE_WEEK_DAYS: i64 = 7;
pub const ARCHIVE_MONTH_DAYS: i64 = 30;
pub const ARCHIVE_SEMESTER_DAYS: i64 = 120;

// Change notification
pub const TASK_CHANGE_CHANNEL_CAPACITY: usize = 256;
