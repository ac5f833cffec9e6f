//! # Profiles
//!
//! The six trainer archetypes of the Academy questionnaire.
//!
//! Each profile owns a set of answer-key tokens (`{question_number}{letter}`).
//! Order matters: scoring walks [`PROFILES`] front to back and the first profile
//! to reach a new maximum keeps it, so ties always go to the earlier entry.
//!
//! | Key | Name | Type |
//! |---|---|---|
//! | cinico | Allenatore Cinico | Tipo Buio |
//! | empatico | Allenatore Empatico | Tipo Folletto |
//! | ansioso | Allenatore Ansioso | Tipo Psico |
//! | aggressivo | Allenatore Aggressivo | Tipo Fuoco/Lotta |
//! | accondiscendente | Allenatore Accondiscendente | Tipo Normale |
//! | equilibrato | Allenatore Equilibrato | Tipo Acciaio |
//!
//! `equilibrato` is both a real profile (4 tokens) and the fallback for a
//! submission that scores zero everywhere.
use std::collections::HashSet;

use serde::Serialize;

use crate::QuizResult;

pub const DEFAULT_PROFILE: &str = "equilibrato";

#[derive(Debug, Serialize)]
pub struct Profile {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
    pub answers: &'static [&'static str],
}

impl Profile {
    /// Size of the intersection between `tokens` and this profile's answer key.
    pub fn score(&self, tokens: &HashSet<String>) -> usize {
        self.answers
            .iter()
            .filter(|key| tokens.contains(**key))
            .count()
    }

    pub fn result(&self) -> QuizResult {
        QuizResult {
            profile_name: self.name.to_string(),
            profile_type: self.kind.to_string(),
            description: self.description.to_string(),
        }
    }
}

const TABLE: [Profile; 6] = [
    Profile {
        key: "cinico",
        name: "Allenatore Cinico",
        kind: "Tipo Buio",
        description: "Stratega diffidente, protegge il cuore dietro l'ironia e il controllo. I suoi Pokémon lo rispettano per la coerenza, non per le parole.",
        answers: &["1a", "2b", "4a", "5d", "6b", "7a", "8b", "9a", "10a"],
    },
    Profile {
        key: "empatico",
        name: "Allenatore Empatico",
        kind: "Tipo Folletto",
        description: "Guida la squadra con gentilezza. Le creature combattono per legame autentico.",
        answers: &["1b", "2a", "3e", "6a", "8a", "9b"],
    },
    Profile {
        key: "ansioso",
        name: "Allenatore Ansioso",
        kind: "Tipo Psico",
        description: "Intuitivo e sensibile, ma teme il fallimento. Deve scoprire la propria forza nascosta.",
        answers: &["1c", "2c", "3c", "4c", "5b", "6c", "7b", "8c", "10e"],
    },
    Profile {
        key: "aggressivo",
        name: "Allenatore Aggressivo",
        kind: "Tipo Fuoco/Lotta",
        description: "Spirito ardente e competitivo. Può diventare grande leader imparando la misura.",
        answers: &["1d", "3a", "3d", "5a", "6d", "7d", "8d", "9c", "10c"],
    },
    Profile {
        key: "accondiscendente",
        name: "Allenatore Accondiscendente",
        kind: "Tipo Normale",
        description: "Cerca armonia e appartenenza, talvolta dimenticando la propria voce.",
        answers: &["1e", "3b", "5e", "6e", "8e", "10d"],
    },
    Profile {
        key: DEFAULT_PROFILE,
        name: "Allenatore Equilibrato",
        kind: "Tipo Acciaio",
        description: "Profilo ideale per l'Accademia: mente lucida, emozioni salde, rispetto per la squadra.",
        answers: &["3e", "5c", "7c", "4b"],
    },
];

pub static PROFILES: [Profile; 6] = TABLE;

/// Position of [`DEFAULT_PROFILE`] in the table, checked at compile time.
const DEFAULT_INDEX: usize = position(&TABLE, DEFAULT_PROFILE);

const fn position(table: &[Profile], key: &str) -> usize {
    let mut i = 0;
    while i < table.len() {
        if same_key(table[i].key.as_bytes(), key.as_bytes()) {
            return i;
        }
        i += 1;
    }

    panic!("default profile missing from the table")
}

const fn same_key(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }

    true
}

pub fn profile(key: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|profile| profile.key == key)
}

pub fn default_profile() -> &'static Profile {
    &PROFILES[DEFAULT_INDEX]
}
