// =============================================================================
// Mingle constants
// =============================================================================
// Tunables used throughout the crate, kept in one place.

// =============================================================================
// SWIPE DECK
// =============================================================================

/// Horizontal drag distance (in gesture units) past which a release becomes
/// a like/dislike decision instead of snapping back to neutral.
pub const SWIPE_THRESHOLD: f64 = 120.0;

/// Divisor mapping horizontal drag distance to card rotation degrees.
pub const SWIPE_ROTATION_DIVISOR: f64 = 20.0;

// =============================================================================
// PARTICIPATION
// =============================================================================

/// Liked-vote quorum used when an activity has no explicit minimum.
pub const DEFAULT_MIN_PARTICIPANTS: i32 = 2;

/// Participant cap used when an activity has no explicit maximum.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 10;

// =============================================================================
// CHAT
// =============================================================================

/// Sentinel display name marking a canonical two-person room. Rooms with
/// this name have their shown title resolved from the other participant.
pub const DIRECT_CHAT_NAME: &str = "Direct Chat";

// =============================================================================
// UPDATES FEED
// =============================================================================

/// Window ahead of now for "starting soon" activity reminders.
pub const UPCOMING_WINDOW_HOURS: i64 = 24;

// =============================================================================
// SOCIAL GRAPH
// =============================================================================

/// Maximum profiles returned by the friend-suggestion listing.
pub const SUGGESTION_LIMIT: i64 = 50;

/// Exclusive upper bound of the random digit suffix appended to generated
/// usernames.
pub const USERNAME_SUFFIX_MAX: u32 = 10_000;

// =============================================================================
// STORAGE
// =============================================================================

/// Object-storage bucket holding activity images.
pub const ACTIVITY_IMAGE_BUCKET: &str = "activity_images";

// =============================================================================
// DATABASE
// =============================================================================

/// Postgres SQLSTATE for a unique-constraint violation. Duplicate votes and
/// duplicate room memberships surface with this code and are suppressed.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Default connection-pool size if not specified in environment.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
