use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod progression;

pub use progression::{
    DifficultyLadder, DifficultyThreshold, LadderError, SubjectFlashcardStats,
};

/// Represents a child learner profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub name: String,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birthdate: String,
    /// Interest ids used to pick flashcard subjects for this child
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

impl Child {
    /// Generate a child ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("child::{}", epoch_millis)
    }

    /// Parse a child ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, ChildIdError> {
        let millis = id.strip_prefix("child::").ok_or(ChildIdError::InvalidFormat)?;
        millis.parse::<u64>().map_err(|_| ChildIdError::InvalidTimestamp)
    }

    /// Extract timestamp from child ID
    pub fn extract_timestamp(&self) -> Result<u64, ChildIdError> {
        Self::parse_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChildIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for ChildIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildIdError::InvalidFormat => write!(f, "Invalid child ID format"),
            ChildIdError::InvalidTimestamp => write!(f, "Invalid timestamp in child ID"),
        }
    }
}

impl std::error::Error for ChildIdError {}

/// The four recordable child-action categories.
///
/// The kind selects both the request path segment and the required body
/// shape; consumers must match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Flashcard,
    Chore,
    Outdoor,
    Affirmation,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Flashcard,
        EventKind::Chore,
        EventKind::Outdoor,
        EventKind::Affirmation,
    ];

    /// The lowercase wire segment for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Flashcard => "flashcard",
            EventKind::Chore => "chore",
            EventKind::Outdoor => "outdoor",
            EventKind::Affirmation => "affirmation",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a flashcard answer event.
///
/// The subject is derived server-side from the flashcard id; the client
/// never includes a subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlashcardEventBody {
    pub flashcard_id: String,
    pub correct: bool,
    /// The raw answer the child gave, when the screen captured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Body of a chore completion event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoreEventBody {
    pub chore_id: String,
    /// Derivable server-side from the chore id; carried for compatibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_extra: Option<bool>,
}

/// Body of an outdoor activity completion event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutdoorEventBody {
    pub outdoor_activity_id: String,
    /// Derivable server-side from the activity id; carried for compatibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_daily: Option<bool>,
}

/// Body of an affirmation view event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AffirmationEventBody {
    pub affirmation_id: String,
}

/// A single recordable action, as a closed tagged union.
///
/// Each kind carries exactly the body fields declared for it; undeclared
/// fields are rejected when a body is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum ProgressEvent {
    Flashcard(FlashcardEventBody),
    Chore(ChoreEventBody),
    Outdoor(OutdoorEventBody),
    Affirmation(AffirmationEventBody),
}

impl ProgressEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProgressEvent::Flashcard(_) => EventKind::Flashcard,
            ProgressEvent::Chore(_) => EventKind::Chore,
            ProgressEvent::Outdoor(_) => EventKind::Outdoor,
            ProgressEvent::Affirmation(_) => EventKind::Affirmation,
        }
    }
}

/// Server acknowledgement for a posted progress event.
///
/// `new_achievement_ids` lists achievements unlocked by this event and is
/// empty when nothing new was unlocked; an absent or non-list field is a
/// protocol defect, not an empty set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAckOut {
    pub points_awarded: u32,
    pub new_achievement_ids: Vec<String>,
}

/// Per-day completion counters for a child
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    #[serde(default)]
    pub points_earned: u32,
    #[serde(default)]
    pub flashcards_completed: u32,
    #[serde(default)]
    pub chores_completed: u32,
    #[serde(default)]
    pub outdoor_completed: u32,
    #[serde(default)]
    pub affirmations_viewed: u32,
}

/// Lifetime completion counters for a child
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeTotals {
    #[serde(default)]
    pub points_earned: u64,
    #[serde(default)]
    pub flashcards_completed: u64,
    #[serde(default)]
    pub chores_completed: u64,
    #[serde(default)]
    pub outdoor_completed: u64,
    #[serde(default)]
    pub affirmations_viewed: u64,
}

/// Aggregate progress rollup for a child, owned by the backend.
///
/// The client holds an immutable validated copy per fetch; it changes the
/// aggregate only by posting events and re-fetching, or by explicitly
/// applying a returned ack via [`ChildProgress::apply_event_ack`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProgress {
    pub total_points: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// ISO 8601 date of the most recent recorded event
    pub last_active_date: String,
    pub today: DailyTotals,
    pub totals: LifetimeTotals,
}

impl ChildProgress {
    /// Optimistically fold an event ack into the point totals.
    ///
    /// Opt-in policy: the ack carries points for exactly one event, so the
    /// fold adds `points_awarded` to the daily, lifetime, and overall point
    /// totals. Streaks and completion counters are left for the next
    /// dashboard fetch, which the server computes authoritatively.
    pub fn apply_event_ack(&self, ack: &EventAckOut) -> ChildProgress {
        let mut next = self.clone();
        next.total_points += u64::from(ack.points_awarded);
        next.today.points_earned += ack.points_awarded;
        next.totals.points_earned += u64::from(ack.points_awarded);
        next
    }
}

/// A flashcard subject a child can practice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub code: String,
    pub name: String,
}

/// Read-model snapshot combining a child's profile, progress totals, and
/// per-subject flashcard stats keyed by subject code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Child>,
    #[serde(flatten)]
    pub progress: ChildProgress,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<Subject>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subject_stats: BTreeMap<String, SubjectFlashcardStats>,
}

/// Response wrapper for a dashboard fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub dashboard: Dashboard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_child_id() {
        let child_id = Child::generate_id(1702516122000);
        assert_eq!(child_id, "child::1702516122000");
    }

    #[test]
    fn test_child_id_round_trips_current_timestamp() {
        let now_millis = chrono::Utc::now().timestamp_millis() as u64;
        let id = Child::generate_id(now_millis);
        assert_eq!(Child::parse_id(&id).unwrap(), now_millis);
    }

    #[test]
    fn test_parse_child_id() {
        // Test valid child ID
        let timestamp = Child::parse_id("child::1702516122000").unwrap();
        assert_eq!(timestamp, 1702516122000);

        // Test invalid format
        assert!(Child::parse_id("invalid::format").is_err());
        assert!(Child::parse_id("child").is_err());
        assert!(Child::parse_id("not_child::123").is_err());

        // Test invalid timestamp
        assert!(Child::parse_id("child::not_a_number").is_err());
    }

    #[test]
    fn test_child_extract_timestamp() {
        let child = Child {
            id: "child::1702516122000".to_string(),
            name: "Test Child".to_string(),
            birthdate: "2018-04-02".to_string(),
            interests: vec!["animals".to_string()],
            avatar_id: Some("fox".to_string()),
            created_at: "2023-12-14T01:02:02.000Z".to_string(),
            updated_at: "2023-12-14T01:02:02.000Z".to_string(),
        };

        assert_eq!(child.extract_timestamp().unwrap(), 1702516122000);
    }

    #[test]
    fn test_event_kind_wire_segments() {
        let segments: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(segments, vec!["flashcard", "chore", "outdoor", "affirmation"]);
    }

    #[test]
    fn test_flashcard_body_serializes_only_declared_fields() {
        let body = FlashcardEventBody {
            flashcard_id: "flashcard::42".to_string(),
            correct: true,
            answer: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["correct", "flashcardId"]);

        let with_answer = FlashcardEventBody {
            answer: Some("7".to_string()),
            ..body
        };
        let value = serde_json::to_value(&with_answer).unwrap();
        assert_eq!(value["answer"], json!("7"));
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_event_bodies_reject_undeclared_fields() {
        let result: Result<FlashcardEventBody, _> = serde_json::from_value(json!({
            "flashcardId": "flashcard::42",
            "correct": true,
            "subjectId": "math",
        }));
        assert!(result.is_err());

        let result: Result<AffirmationEventBody, _> = serde_json::from_value(json!({
            "affirmationId": "affirmation::3",
            "extra": 1,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_event_kind_mapping() {
        let events = [
            ProgressEvent::Flashcard(FlashcardEventBody {
                flashcard_id: "f".to_string(),
                correct: false,
                answer: None,
            }),
            ProgressEvent::Chore(ChoreEventBody {
                chore_id: "c".to_string(),
                is_extra: None,
            }),
            ProgressEvent::Outdoor(OutdoorEventBody {
                outdoor_activity_id: "o".to_string(),
                is_daily: Some(true),
            }),
            ProgressEvent::Affirmation(AffirmationEventBody {
                affirmation_id: "a".to_string(),
            }),
        ];
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.as_slice(), EventKind::ALL.as_slice());
    }

    #[test]
    fn test_event_ack_requires_achievement_list() {
        let ack: EventAckOut = serde_json::from_value(json!({
            "pointsAwarded": 5,
            "newAchievementIds": [],
        }))
        .unwrap();
        assert_eq!(ack.points_awarded, 5);
        assert!(ack.new_achievement_ids.is_empty());

        // An absent or non-list field is a defect, not an empty set
        let missing: Result<EventAckOut, _> =
            serde_json::from_value(json!({ "pointsAwarded": 5 }));
        assert!(missing.is_err());

        let not_a_list: Result<EventAckOut, _> = serde_json::from_value(json!({
            "pointsAwarded": 5,
            "newAchievementIds": "badge",
        }));
        assert!(not_a_list.is_err());
    }

    #[test]
    fn test_event_ack_rejects_negative_points() {
        let negative: Result<EventAckOut, _> = serde_json::from_value(json!({
            "pointsAwarded": -1,
            "newAchievementIds": [],
        }));
        assert!(negative.is_err());
    }

    #[test]
    fn test_apply_event_ack_adds_points_only() {
        let progress = ChildProgress {
            total_points: 100,
            current_streak: 3,
            longest_streak: 7,
            last_active_date: "2025-06-01".to_string(),
            today: DailyTotals {
                points_earned: 10,
                flashcards_completed: 2,
                ..Default::default()
            },
            totals: LifetimeTotals {
                points_earned: 100,
                flashcards_completed: 40,
                ..Default::default()
            },
        };

        let ack = EventAckOut {
            points_awarded: 5,
            new_achievement_ids: vec!["achievement::first-week".to_string()],
        };

        let updated = progress.apply_event_ack(&ack);
        assert_eq!(updated.total_points, 105);
        assert_eq!(updated.today.points_earned, 15);
        assert_eq!(updated.totals.points_earned, 105);

        // Streaks and completion counters wait for the next fetch
        assert_eq!(updated.current_streak, progress.current_streak);
        assert_eq!(updated.today.flashcards_completed, progress.today.flashcards_completed);
        assert_eq!(updated.last_active_date, progress.last_active_date);
    }

    #[test]
    fn test_dashboard_round_trips_identically() {
        let dashboard = Dashboard {
            child: None,
            progress: ChildProgress {
                total_points: 42,
                current_streak: 2,
                longest_streak: 5,
                last_active_date: "2025-01-01".to_string(),
                today: DailyTotals::default(),
                totals: LifetimeTotals::default(),
            },
            subjects: vec![Subject {
                code: "math".to_string(),
                name: "Math".to_string(),
            }],
            subject_stats: BTreeMap::from([(
                "math".to_string(),
                SubjectFlashcardStats {
                    correct: 4,
                    correct_streak: 2,
                    longest_streak: 3,
                    completed: 6,
                    difficulty_code: Some("easy".to_string()),
                    next_difficulty_at_streak: Some(5),
                    current_tier_start_at_streak: 0,
                },
            )]),
        };

        let value = serde_json::to_value(&dashboard).unwrap();
        // Progress fields sit at the top level of the wire shape
        assert_eq!(value["totalPoints"], json!(42));
        assert_eq!(value["subjectStats"]["math"]["correctStreak"], json!(2));

        let parsed: Dashboard = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, dashboard);
    }
}
