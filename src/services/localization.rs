use crate::models::DEFAULT_LANGUAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    Chapter,
    /// Opens the closing question, e.g. "Will you choose option A".
    OptionA,
    OptionB,
}

struct Entry {
    language: &'static str,
    chapter: &'static str,
    option_a: &'static str,
    option_b: &'static str,
}

const TABLE: &[Entry] = &[
    Entry {
        language: "English",
        chapter: "Chapter",
        option_a: "Will you choose option A",
        option_b: "or option B",
    },
    Entry {
        language: "Spanish",
        chapter: "Capítulo",
        option_a: "¿Elegirás la opción A",
        option_b: "o la opción B",
    },
    Entry {
        language: "French",
        chapter: "Chapitre",
        option_a: "Choisirez-vous l'option A",
        option_b: "ou l'option B",
    },
    Entry {
        language: "German",
        chapter: "Kapitel",
        option_a: "Wählst du Option A",
        option_b: "oder Option B",
    },
    Entry {
        language: "Italian",
        chapter: "Capitolo",
        option_a: "Sceglierai l'opzione A",
        option_b: "o l'opzione B",
    },
    Entry {
        language: "Portuguese",
        chapter: "Capítulo",
        option_a: "Você escolherá a opção A",
        option_b: "ou a opção B",
    },
    Entry {
        language: "Dutch",
        chapter: "Hoofdstuk",
        option_a: "Kies je optie A",
        option_b: "of optie B",
    },
];

fn entry_for(language: &str) -> Option<&'static Entry> {
    let language = language.trim();
    TABLE
        .iter()
        .find(|entry| entry.language.eq_ignore_ascii_case(language))
}

pub fn is_supported(language: &str) -> bool {
    entry_for(language).is_some()
}

/// Looks up a phrase, falling back to English for languages not in the table.
pub fn lookup(phrase: Phrase, language: &str) -> &'static str {
    let entry = entry_for(language).unwrap_or_else(|| {
        tracing::debug!(language, "no translations for language, using {DEFAULT_LANGUAGE}");
        &TABLE[0]
    });

    match phrase {
        Phrase::Chapter => entry.chapter,
        Phrase::OptionA => entry.option_a,
        Phrase::OptionB => entry.option_b,
    }
}
