//! Static verb table.

use rand::Rng;

use crate::error::LexiconError;
use crate::types::VerbEntry;

/// Built-in verbs: (infinitive, translation, sample sentence, sample translation, category).
///
/// Every sample sentence passes [`crate::matching::check_sentence_usage`] for its verb, so
/// strong and separable verbs use forms the stem heuristic recognises.
const BUILTIN_VERBS: &[(&str, &str, &str, &str, &str)] = &[
    ("gehen", "to go", "Ich gehe jeden Morgen zur Arbeit.", "I go to work every morning.", "irregular"),
    ("machen", "to do", "Was machst du am Wochenende?", "What are you doing at the weekend?", "regular"),
    ("spielen", "to play", "Die Kinder spielen im Garten.", "The children play in the garden.", "regular"),
    ("lernen", "to learn", "Wir lernen jeden Tag Deutsch.", "We learn German every day.", "regular"),
    ("sehen", "to see", "Ich sehe das Haus dort drüben.", "I see the house over there.", "irregular"),
    ("kaufen", "to buy", "Sie kauft frisches Brot beim Bäcker.", "She buys fresh bread at the bakery.", "regular"),
    ("fahren", "to drive", "Wir fahren mit dem Auto nach Berlin.", "We drive to Berlin by car.", "irregular"),
    ("essen", "to eat", "Wir essen um sieben Uhr zu Abend.", "We eat dinner at seven o'clock.", "irregular"),
    ("wohnen", "to live", "Meine Eltern wohnen in einem kleinen Dorf.", "My parents live in a small village.", "regular"),
    ("arbeiten", "to work", "Mein Bruder arbeitet in einem Krankenhaus.", "My brother works in a hospital.", "regular"),
    ("können", "to be able to", "Wir können dir morgen helfen.", "We can help you tomorrow.", "modal"),
    ("anrufen", "to call", "Ich möchte dich morgen anrufen.", "I would like to call you tomorrow.", "separable"),
];

/// A non-empty set of verbs to draw rounds from.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<VerbEntry>,
}

impl Lexicon {
    /// Create a lexicon from entries. Fails if there are none.
    pub fn new(entries: Vec<VerbEntry>) -> Result<Self, LexiconError> {
        if entries.is_empty() {
            return Err(LexiconError::Empty);
        }
        Ok(Self { entries })
    }

    /// The built-in German verb table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_VERBS
            .iter()
            .map(|(verb, translation, sentence, sentence_en, category)| {
                VerbEntry::new(*verb, *translation, *sentence, *sentence_en).with_category(*category)
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[VerbEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick a verb uniformly at random.
    pub fn pick(&self) -> VerbEntry {
        self.pick_with(&mut rand::thread_rng())
    }

    /// Pick a verb uniformly using the given RNG.
    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> VerbEntry {
        let index = rng.gen_range(0..self.entries.len());
        self.entries[index].clone()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}
