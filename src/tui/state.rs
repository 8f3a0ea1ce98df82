use crate::model::{
    cycle, AppEvent, GenerationParameters, HistoryRecord, Length, Platform, Tone, UiCommand,
    VariantCount,
};

pub const TAB_COMPOSE: usize = 0;
pub const TAB_RESULTS: usize = 1;
pub const TAB_HISTORY: usize = 2;
pub const TAB_HELP: usize = 3;
pub const TAB_COUNT: usize = 4;

/// Focusable fields of the compose form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topic,
    Tone,
    Platform,
    Length,
    Variants,
    Emojis,
    Hashtags,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Topic,
        Field::Tone,
        Field::Platform,
        Field::Length,
        Field::Variants,
        Field::Emojis,
        Field::Hashtags,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Topic => "Topic",
            Field::Tone => "Tone",
            Field::Platform => "Platform",
            Field::Length => "Length",
            Field::Variants => "Variants",
            Field::Emojis => "Emojis",
            Field::Hashtags => "Hashtags",
        }
    }
}

/// View-side mirror of the session. Only the UI thread touches it; core state
/// arrives through [`AppEvent`]s.
pub struct UiState {
    pub tab: usize,
    pub info: String,

    // Compose form
    pub focus: Field,
    pub topic: String,
    pub tone: Tone,
    pub platform: Platform,
    pub length: Length,
    pub variants_input: String,
    pub include_emojis: bool,
    pub include_hashtags: bool,

    // Mirrors of controller-owned state
    pub pending: bool,
    pub error: Option<String>,
    pub results: Vec<String>,
    pub history: Vec<HistoryRecord>,

    pub results_selected: usize,
    pub history_selected: usize, // Index into history_rows()

    // A refresh or favorite note is showing in `info` until history settles.
    pub history_busy: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: TAB_COMPOSE,
            info: String::new(),
            focus: Field::Topic,
            topic: String::new(),
            tone: Tone::Friendly,
            platform: Platform::Instagram,
            length: Length::Medium,
            variants_input: VariantCount::default().to_string(),
            include_emojis: true,
            include_hashtags: true,
            pending: false,
            error: None,
            results: Vec::new(),
            history: Vec::new(),
            results_selected: 0,
            history_selected: 0,
            history_busy: false,
        }
    }
}

impl UiState {
    pub fn variant_count(&self) -> VariantCount {
        VariantCount::parse_lenient(&self.variants_input)
    }

    /// Rewrite the variants field with its normalized value.
    pub fn normalize_variants(&mut self) {
        self.variants_input = self.variant_count().to_string();
    }

    pub fn focus_next(&mut self, forward: bool) {
        if self.focus == Field::Variants {
            self.normalize_variants();
        }
        self.focus = cycle(&Field::ALL, self.focus, forward);
    }

    /// Left/Right on the focused field.
    pub fn adjust_focused(&mut self, forward: bool) {
        match self.focus {
            Field::Topic => {}
            Field::Tone => self.tone = cycle(&Tone::ALL, self.tone, forward),
            Field::Platform => self.platform = cycle(&Platform::ALL, self.platform, forward),
            Field::Length => self.length = cycle(&Length::ALL, self.length, forward),
            Field::Variants => {
                let n = self.variant_count();
                let n = if forward { n.increment() } else { n.decrement() };
                self.variants_input = n.to_string();
            }
            Field::Emojis => self.include_emojis = !self.include_emojis,
            Field::Hashtags => self.include_hashtags = !self.include_hashtags,
        }
    }

    /// Typed character on the focused field. Returns false if the field does not take text.
    pub fn type_char(&mut self, c: char) -> bool {
        match self.focus {
            Field::Topic => {
                self.topic.push(c);
                true
            }
            Field::Variants => {
                if self.variants_input.len() < 3 {
                    self.variants_input.push(c);
                }
                true
            }
            _ => false,
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Field::Topic => {
                self.topic.pop();
            }
            Field::Variants => {
                self.variants_input.pop();
            }
            _ => {}
        }
    }

    /// Build a generate command from the form. Inert while a generation is pending.
    pub fn submit(&mut self) -> Option<UiCommand> {
        if self.pending {
            return None;
        }
        self.normalize_variants();
        match GenerationParameters::new(
            self.topic.clone(),
            self.tone,
            self.platform,
            self.length,
            self.include_emojis,
            self.include_hashtags,
            self.variant_count(),
        ) {
            Ok(params) => {
                // Flip locally too so a second key press before the controller
                // answers is already inert.
                self.pending = true;
                self.error = None;
                Some(UiCommand::Generate(params))
            }
            Err(e) => {
                self.info = e.to_string();
                None
            }
        }
    }

    pub fn apply_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::GenerationStarted => {
                self.pending = true;
                self.info = "Generating...".into();
            }
            AppEvent::GenerationSucceeded { variants } => {
                self.pending = false;
                self.error = None;
                self.info = format!("Generated {} caption(s)", variants.len());
                self.results = variants;
                self.results_selected = 0;
            }
            AppEvent::GenerationFailed { message } => {
                self.pending = false;
                self.info.clear();
                self.error = Some(message);
            }
            AppEvent::HistoryUpdated { records } => {
                self.settle_history_note();
                self.history = records;
                let rows = self.history_rows().len();
                if self.history_selected >= rows {
                    self.history_selected = rows.saturating_sub(1);
                }
            }
            AppEvent::HistoryUnchanged => self.settle_history_note(),
            AppEvent::Info(msg) => self.info = msg,
        }
    }

    /// Show a status note that lasts until the next history refresh settles.
    pub fn note_history_busy(&mut self, note: &str) {
        self.info = note.to_string();
        self.history_busy = true;
    }

    fn settle_history_note(&mut self) {
        if self.history_busy {
            self.history_busy = false;
            self.info.clear();
        }
    }

    /// Flattened (record index, variant index) pairs, one per displayed variant.
    pub fn history_rows(&self) -> Vec<(usize, usize)> {
        self.history
            .iter()
            .enumerate()
            .flat_map(|(ri, r)| (0..r.variants.len()).map(move |vi| (ri, vi)))
            .collect()
    }

    pub fn selected_history(&self) -> Option<(&HistoryRecord, usize)> {
        let (ri, vi) = *self.history_rows().get(self.history_selected)?;
        Some((&self.history[ri], vi))
    }

    pub fn selected_result(&self) -> Option<&str> {
        self.results.get(self.results_selected).map(String::as_str)
    }

    /// Favorite command for the selected history variant, if the record is not favorited yet.
    pub fn favorite_selected(&self) -> Option<UiCommand> {
        let (record, index) = self.selected_history()?;
        if record.favorite {
            return None;
        }
        Some(UiCommand::Favorite {
            id: record.id.clone(),
            index,
        })
    }

    pub fn move_selection(&mut self, down: bool) {
        let (selected, len) = match self.tab {
            TAB_RESULTS => (&mut self.results_selected, self.results.len()),
            TAB_HISTORY => {
                let len = self.history_rows().len();
                (&mut self.history_selected, len)
            }
            _ => return,
        };
        if down {
            if *selected + 1 < len {
                *selected += 1;
            }
        } else {
            *selected = selected.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::record;

    fn composed() -> UiState {
        UiState {
            topic: "Summer sale".into(),
            ..Default::default()
        }
    }

    #[test]
    fn submit_is_inert_while_pending() {
        let mut state = composed();
        assert!(matches!(state.submit(), Some(UiCommand::Generate(_))));
        assert!(state.pending);
        assert!(state.submit().is_none());

        state.apply_event(AppEvent::GenerationFailed {
            message: "Failed to generate".into(),
        });
        assert!(!state.pending);
        assert!(state.submit().is_some());
    }

    #[test]
    fn submit_normalizes_variant_input() {
        for (raw, expected) in [("0", 1), ("1", 1), ("10", 10), ("11", 10), ("abc", 1)] {
            let mut state = composed();
            state.variants_input = raw.into();
            match state.submit() {
                Some(UiCommand::Generate(p)) => assert_eq!(p.variant_count.get(), expected),
                other => panic!("unexpected command: {other:?}"),
            }
            assert_eq!(state.variants_input, expected.to_string());
        }
    }

    #[test]
    fn empty_topic_shows_message_and_sends_nothing() {
        let mut state = UiState::default();
        assert!(state.submit().is_none());
        assert_eq!(state.info, "Topic must not be empty");
        assert!(!state.pending);
    }

    #[test]
    fn failure_keeps_results_and_success_replaces_them() {
        let mut state = composed();
        state.apply_event(AppEvent::GenerationSucceeded {
            variants: vec!["A".into(), "B".into()],
        });
        state.apply_event(AppEvent::GenerationFailed {
            message: "Failed to generate".into(),
        });
        assert_eq!(state.results, ["A", "B"]);
        assert_eq!(state.error.as_deref(), Some("Failed to generate"));

        state.apply_event(AppEvent::GenerationSucceeded {
            variants: vec!["C".into()],
        });
        assert_eq!(state.results, ["C"]);
        assert!(state.error.is_none());
    }

    #[test]
    fn favorite_offered_only_for_unfavorited_records() {
        let mut state = composed();
        state.apply_event(AppEvent::HistoryUpdated {
            records: vec![record("a", true), record("b", false)],
        });
        state.tab = TAB_HISTORY;

        assert!(state.favorite_selected().is_none());
        state.move_selection(true);
        state.move_selection(true);
        state.move_selection(true);
        match state.favorite_selected() {
            Some(UiCommand::Favorite { id, index }) => {
                assert_eq!(id, "b");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn history_note_clears_when_refresh_settles() {
        let mut state = composed();
        state.note_history_busy("Refreshing history…");
        state.apply_event(AppEvent::HistoryUnchanged);
        assert!(state.info.is_empty());

        state.note_history_busy("Favoriting…");
        state.apply_event(AppEvent::HistoryUpdated { records: vec![] });
        assert!(state.info.is_empty());

        state.info = "Copied to clipboard!".into();
        state.apply_event(AppEvent::HistoryUnchanged);
        assert_eq!(state.info, "Copied to clipboard!");
    }

    #[test]
    fn history_selection_clamped_when_list_shrinks() {
        let mut state = composed();
        state.apply_event(AppEvent::HistoryUpdated {
            records: vec![record("a", false), record("b", false)],
        });
        state.history_selected = 3;
        state.apply_event(AppEvent::HistoryUpdated {
            records: vec![record("a", false)],
        });
        assert_eq!(state.history_selected, 1);

        state.apply_event(AppEvent::HistoryUpdated { records: vec![] });
        assert_eq!(state.history_selected, 0);
        assert!(state.selected_history().is_none());
    }

    #[test]
    fn variants_field_steps_within_range() {
        let mut state = composed();
        state.focus = Field::Variants;
        state.variants_input = "10".into();
        state.adjust_focused(true);
        assert_eq!(state.variants_input, "10");
        state.variants_input = "1".into();
        state.adjust_focused(false);
        assert_eq!(state.variants_input, "1");
    }

    #[test]
    fn leaving_variants_field_normalizes_it() {
        let mut state = composed();
        state.focus = Field::Variants;
        state.variants_input = "42".into();
        state.focus_next(true);
        assert_eq!(state.variants_input, "10");
        assert_eq!(state.focus, Field::Emojis);
    }
}
