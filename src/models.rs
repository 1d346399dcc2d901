use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::text::normalize;

/// Scraped faculty profile. Only the name and research text are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Professor {
    #[serde(rename = "Professor Name")]
    pub name: String,
    #[serde(rename = "Areas of Interest / Research Interests", default)]
    pub research_interests: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Current Research", default)]
    pub current_research: String,
}

impl Professor {
    /// Normalized research profile: current research, interests, then description.
    pub fn profile_text(&self) -> String {
        normalize(&format!(
            "{} {} {}",
            self.current_research, self.research_interests, self.description
        ))
    }
}

/// Presentation hour of a poster session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeSlot {
    First,
    Second,
}

impl TimeSlot {
    /// Odd poster numbers present in the first hour, even ones in the second.
    pub fn for_poster(poster_id: u32) -> Self {
        if poster_id % 2 == 1 {
            TimeSlot::First
        } else {
            TimeSlot::Second
        }
    }

    pub fn number(self) -> u8 {
        match self {
            TimeSlot::First => 1,
            TimeSlot::Second => 2,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Availability {
    Both,
    Slot(TimeSlot),
}

impl Availability {
    pub fn covers(self, slot: TimeSlot) -> bool {
        match self {
            Availability::Both => true,
            Availability::Slot(own) => own == slot,
        }
    }
}

impl TryFrom<String> for Availability {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("both") {
            return Ok(Availability::Both);
        }
        match trimmed.parse::<u8>() {
            Ok(1) => Ok(Availability::Slot(TimeSlot::First)),
            Ok(2) => Ok(Availability::Slot(TimeSlot::Second)),
            _ => Err(format!(
                "invalid hour available {value:?} (expected \"both\", \"1\" or \"2\")"
            )),
        }
    }
}

impl From<Availability> for String {
    fn from(value: Availability) -> Self {
        match value {
            Availability::Both => "both".to_string(),
            Availability::Slot(slot) => slot.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Judge {
    #[serde(rename = "Judge")]
    pub id: u32,
    #[serde(rename = "Judge FirstName")]
    pub first_name: String,
    #[serde(rename = "Judge LastName")]
    pub last_name: String,
    #[serde(rename = "Department", default)]
    pub department: String,
    #[serde(rename = "Hour available")]
    pub availability: Availability,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Poster {
    #[serde(rename = "Poster #")]
    pub id: u32,
    #[serde(rename = "Program", default)]
    pub program: String,
    #[serde(rename = "Abstract", default)]
    pub abstract_text: String,
}

impl Poster {
    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot::for_poster(self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Semantic,
    Lexical,
    Field,
    Expertise,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Semantic => "semantic",
            Component::Lexical => "lexical",
            Component::Field => "field",
            Component::Expertise => "expertise",
        };
        f.write_str(name)
    }
}

/// Per-component breakdown of a match score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreComponents {
    pub semantic: f64,
    pub lexical: f64,
    pub field: f64,
    pub expertise: f64,
    /// Components that failed and were zeroed.
    pub failures: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub poster_id: u32,
    pub judge_id: u32,
    pub time_slot: TimeSlot,
    pub score: f64,
    pub components: ScoreComponents,
}

/// Poster to judge relation produced by the assigner, in placement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub poster_judges: BTreeMap<u32, Vec<u32>>,
    pub judge_posters: BTreeMap<u32, Vec<u32>>,
}

impl Assignment {
    pub fn new(poster_ids: impl IntoIterator<Item = u32>, judge_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            poster_judges: poster_ids.into_iter().map(|id| (id, Vec::new())).collect(),
            judge_posters: judge_ids.into_iter().map(|id| (id, Vec::new())).collect(),
        }
    }

    pub fn judges_for(&self, poster_id: u32) -> &[u32] {
        self.poster_judges
            .get(&poster_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn posters_for(&self, judge_id: u32) -> &[u32] {
        self.judge_posters
            .get(&judge_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn commit(&mut self, poster_id: u32, judge_id: u32) {
        self.poster_judges.entry(poster_id).or_default().push(judge_id);
        self.judge_posters.entry(judge_id).or_default().push(poster_id);
    }

    pub fn pair_count(&self) -> usize {
        self.poster_judges.values().map(Vec::len).sum()
    }
}

/// One row of the poster output table as read back for matrix building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterAssignmentRow {
    pub poster_id: u32,
    pub assigned_judges: Vec<String>,
}

impl PosterAssignmentRow {
    pub fn from_assignment(assignment: &Assignment, poster_slots: usize) -> Vec<Self> {
        assignment
            .poster_judges
            .iter()
            .map(|(poster_id, judges)| {
                let mut assigned_judges: Vec<String> =
                    judges.iter().map(|id| id.to_string()).collect();
                assigned_judges.resize(poster_slots.max(judges.len()), String::new());
                PosterAssignmentRow {
                    poster_id: *poster_id,
                    assigned_judges,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScore {
    #[serde(rename = "Poster Number")]
    pub poster_id: u32,
    #[serde(rename = "Judge #")]
    pub judge_id: u32,
    #[serde(rename = "Innovation")]
    pub innovation: u32,
    #[serde(rename = "Clarity")]
    pub clarity: u32,
    #[serde(rename = "Presentation")]
    pub presentation: u32,
    #[serde(rename = "Total")]
    pub total: u32,
}

impl RubricScore {
    pub fn empty(poster_id: u32, judge_id: u32) -> Self {
        Self {
            poster_id,
            judge_id,
            innovation: 0,
            clarity: 0,
            presentation: 0,
            total: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRubricRow {
    #[serde(rename = "Poster Number")]
    pub poster_id: u32,
    #[serde(rename = "Judge #")]
    pub judge_id: u32,
    #[serde(rename = "Innovation")]
    pub innovation: u32,
    #[serde(rename = "Clarity")]
    pub clarity: u32,
    #[serde(rename = "Presentation")]
    pub presentation: u32,
    #[serde(rename = "Total")]
    pub total: u32,
    #[serde(rename = "Rank")]
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPoster {
    pub poster_id: u32,
    pub sum_total: u64,
    pub innovation: f64,
    pub clarity: f64,
    pub presentation: f64,
    pub rank: u32,
}
