//! Interactive session state machine.
//!
//! One [`Session`] owns the whole two-phase flow: phase 1 turns queries into
//! ranked passage matches, phase 2 turns a chosen match into an adjustable
//! sentence run. Transitions are pure over the session value and return
//! effect descriptions; terminal and editor wiring live in the command
//! driver, which keeps the machine testable without any UI.
//!
//! The source text load is the only asynchronous boundary: queries arriving
//! before it resolves quietly match nothing, and a load resolving after the
//! session closed is a silent no-op.

use anyhow::Result;

use crate::config::QuoteConfig;
use crate::format::render_selection;
use crate::models::{CursorPos, Match};
use crate::search::find_matches;
use crate::selection::Selection;
use crate::source::SourceText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the source text; queries return no matches.
    Loading,
    /// Phase 1: query in, ranked matches out.
    Searching,
    /// Phase 2: a selection exists and is being adjusted.
    Previewing,
    /// Committed or dismissed; all cached state released.
    Closed,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The awaited source read resolved.
    SourceLoaded(SourceText),
    /// The query text changed (every keystroke in an interactive driver).
    QueryChanged(String),
    /// A match from the last rendered list was chosen (zero-based).
    MatchChosen(usize),
    /// Adjust the selection by a signed number of sentences.
    Step(isize),
    /// Commit the current selection.
    Confirm,
    /// Close without committing.
    Dismiss,
}

/// Side-effect descriptions returned by [`Session::handle`]. The driver
/// interprets these; the machine never touches a terminal or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowMatches(Vec<Match>),
    ShowQuote(String),
    /// Hand the rendered quote and the captured insertion point to the
    /// insertion collaborator.
    Insert { at: CursorPos, text: String },
    Close,
}

pub struct Session {
    state: SessionState,
    cfg: QuoteConfig,
    insert_at: CursorPos,
    source: Option<SourceText>,
    matches: Vec<Match>,
    selection: Option<Selection>,
}

impl Session {
    /// Open a session with a config snapshot and a captured insertion point.
    pub fn open(cfg: QuoteConfig, insert_at: CursorPos) -> Self {
        Self {
            state: SessionState::Loading,
            cfg,
            insert_at,
            source: None,
            matches: Vec::new(),
            selection: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Sentence count of the live selection, if previewing.
    pub fn selection_count(&self) -> Option<usize> {
        self.selection.as_ref().map(Selection::count)
    }

    pub fn selection_total(&self) -> Option<usize> {
        self.selection.as_ref().map(Selection::total)
    }

    /// Apply one event and return the effects the driver should perform.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<Effect>> {
        match event {
            SessionEvent::SourceLoaded(source) => {
                // A load resolving after close must not write anywhere.
                if self.state == SessionState::Closed {
                    return Ok(Vec::new());
                }
                if self.source.is_none() {
                    self.source = Some(source);
                    if self.state == SessionState::Loading {
                        self.state = SessionState::Searching;
                    }
                }
                Ok(Vec::new())
            }

            SessionEvent::QueryChanged(query) => {
                if !matches!(
                    self.state,
                    SessionState::Loading | SessionState::Searching
                ) {
                    return Ok(Vec::new());
                }
                let matches = match &self.source {
                    Some(source) => find_matches(source, &query, &self.cfg)?,
                    // Not loaded yet: quietly no matches.
                    None => Vec::new(),
                };
                self.matches = matches.clone();
                Ok(vec![Effect::ShowMatches(matches)])
            }

            SessionEvent::MatchChosen(index) => {
                if self.state != SessionState::Searching {
                    return Ok(Vec::new());
                }
                let (source, chosen) = match (&self.source, self.matches.get(index)) {
                    (Some(source), Some(chosen)) => (source, chosen),
                    _ => return Ok(Vec::new()),
                };
                let sample = source.sample_at(chosen.offset, self.cfg.sample_chars);
                let selection = Selection::from_sample(&sample, self.cfg.initial_sentences);
                let rendered = self.render(&selection);
                self.selection = Some(selection);
                self.state = SessionState::Previewing;
                Ok(vec![Effect::ShowQuote(rendered)])
            }

            SessionEvent::Step(delta) => {
                if self.state != SessionState::Previewing {
                    return Ok(Vec::new());
                }
                let selection = match self.selection.as_mut() {
                    Some(selection) => selection,
                    None => return Ok(Vec::new()),
                };
                selection.step(delta);
                let rendered = render_selection(
                    selection,
                    self.cfg.style,
                    &self.cfg.callout_header,
                );
                Ok(vec![Effect::ShowQuote(rendered)])
            }

            SessionEvent::Confirm => {
                if self.state != SessionState::Previewing {
                    self.close();
                    return Ok(vec![Effect::Close]);
                }
                let text = match &self.selection {
                    Some(selection) => self.render(selection),
                    None => String::new(),
                };
                let at = self.insert_at;
                self.close();
                Ok(vec![Effect::Insert { at, text }, Effect::Close])
            }

            SessionEvent::Dismiss => {
                self.close();
                Ok(vec![Effect::Close])
            }
        }
    }

    fn render(&self, selection: &Selection) -> String {
        render_selection(selection, self.cfg.style, &self.cfg.callout_header)
    }

    fn close(&mut self) {
        self.state = SessionState::Closed;
        self.source = None;
        self.matches.clear();
        self.selection = None;
    }
}
