use crate::models::PriorChapter;

/// Upper bound on how long one chapter should take to read aloud.
pub const READING_SECONDS: u32 = 45;

/// Image models get their prompt in this language regardless of the story's.
pub const IMAGE_PROMPT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub chapter_number: u32,
    pub previous_chapters: &'a [PriorChapter],
    pub previous_option: Option<&'a str>,
    pub language: &'a str,
    pub genre: Option<&'a str>,
}

pub fn chapter_label(chapter_number: u32) -> String {
    format!("Chapter {chapter_number}")
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let label = chapter_label(ctx.chapter_number);
    let first = ctx.chapter_number == 1;
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Let's create a \"Choose Your Destiny\" style story that is appropriate for all ages. \
         You are to write {label} of the story only.\n\n\
         Write the chapter narrative, then two choices for the reader. \
         The reader's choice decides the direction of the next chapter.\n\n"
    ));

    if first {
        match ctx.genre.map(str::trim).filter(|g| !g.is_empty()) {
            Some(genre) => prompt.push_str(&format!("The story's genre is {genre}.\n\n")),
            None => prompt.push_str("Pick a genre for the story.\n\n"),
        }
    } else if !ctx.previous_chapters.is_empty() {
        let history = serde_json::to_string(ctx.previous_chapters).unwrap_or_default();
        prompt.push_str(&format!(
            "For context, here are the previous chapters and the option the reader chose at the end of the last one:\n\
             - Previous chapters: {history}\n\
             - Chosen option: {}\n\n",
            ctx.previous_option.unwrap_or_default()
        ));
    }

    prompt.push_str(
        "Respond with a JSON object structured exactly like this:\n\
         {\n\
         \x20   \"content\": \"string\",\n\
         \x20   \"optionA\": \"string\",\n\
         \x20   \"optionB\": \"string\",\n\
         \x20   \"image\": \"string\",\n\
         \x20   \"title\": \"string\"\n\
         }\n\n\
         Rules:\n",
    );

    if first {
        prompt.push_str(
            " - This is the first chapter: set \"title\" to the story's title. \
             Never put a chapter number in the title.\n",
        );
        prompt.push_str(&format!(
            " - Set \"image\" to a prompt for an image generator that depicts the story. \
             Write the image prompt in {IMAGE_PROMPT_LANGUAGE}.\n"
        ));
    } else {
        prompt.push_str(" - Leave \"title\" and \"image\" as empty strings.\n");
    }

    prompt.push_str(&format!(
        " - The chapter must take no more than {READING_SECONDS} seconds to read.\n\
         \x20- Do not repeat the options inside \"content\"; they belong only in \"optionA\" and \"optionB\".\n\
         \x20- Write \"content\", \"optionA\", \"optionB\" and \"title\" in {}.\n\
         \x20- Your response must be a single valid JSON object and nothing else: no code fences, no commentary, \
         no characters that would break JSON parsing.\n",
        ctx.language
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn first_chapter<'a>(genre: Option<&'a str>) -> PromptContext<'a> {
        PromptContext {
            chapter_number: 1,
            previous_chapters: &[],
            previous_option: None,
            language: "English",
            genre,
        }
    }

    #[test]
    fn first_chapter_asks_for_title_and_image() {
        let prompt = build_prompt(&first_chapter(Some("mystery")));

        assert!(prompt.contains("Chapter 1 of the story only"));
        assert!(prompt.contains("genre is mystery"));
        assert!(prompt.contains("set \"title\""));
        assert!(prompt.contains("Never put a chapter number in the title"));
        assert!(prompt.contains("Write the image prompt in English"));
        assert!(!prompt.contains("previous chapters"));
    }

    #[test]
    fn first_chapter_without_genre_lets_model_pick() {
        let prompt = build_prompt(&first_chapter(Some("  ")));
        assert!(prompt.contains("Pick a genre"));
    }

    #[test]
    fn later_chapter_includes_history_and_choice() {
        let history = vec![json!({ "content": "The cave was dark." })];
        let prompt = build_prompt(&PromptContext {
            chapter_number: 2,
            previous_chapters: &history,
            previous_option: Some("Light a torch"),
            language: "French",
            genre: Some("horror"),
        });

        assert!(prompt.contains("Chapter 2 of the story only"));
        assert!(prompt.contains("The cave was dark."));
        assert!(prompt.contains("Chosen option: Light a torch"));
        assert!(prompt.contains("Leave \"title\" and \"image\" as empty strings"));
        assert!(prompt.contains("\"title\" in French"));
        assert!(!prompt.contains("horror"));
    }

    #[test]
    fn reading_bound_and_fields_are_stated() {
        let prompt = build_prompt(&first_chapter(None));
        assert!(prompt.contains(&format!("no more than {READING_SECONDS} seconds")));
        for field in ["content", "optionA", "optionB", "image", "title"] {
            assert!(prompt.contains(&format!("\"{field}\": \"string\"")));
        }
    }
}
