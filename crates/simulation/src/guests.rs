//! Synthetic guest directory

use catalog::{Guest, GuestId};

pub const DEFAULT_FIRST_GUEST_ID: GuestId = 100;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Chiara", "Dmitri", "Esther", "Farid", "Greta", "Hiro", "Ines", "Jonas",
    "Kemal", "Lucia", "Marek", "Nadia", "Oskar", "Priya",
];

/// Guests with consecutive ids starting at `first_id`
#[derive(Debug, Clone, Copy)]
pub struct GuestDirectorySimulator {
    first_id: GuestId,
}

impl GuestDirectorySimulator {
    pub fn new(first_id: GuestId) -> Self {
        Self { first_id }
    }

    /// Names cycle through a fixed list; later rounds get a numeric suffix.
    pub fn generate(&self, num_guests: usize) -> Vec<Guest> {
        (0..num_guests)
            .map(|i| {
                let base = FIRST_NAMES[i % FIRST_NAMES.len()];
                let round = i / FIRST_NAMES.len();
                let name = if round == 0 {
                    base.to_string()
                } else {
                    format!("{} {}", base, round + 1)
                };
                Guest {
                    id: self.first_id + i as GuestId,
                    name,
                }
            })
            .collect()
    }
}

impl Default for GuestDirectorySimulator {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_GUEST_ID)
    }
}
