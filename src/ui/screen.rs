use ratatui::Frame;

use pileup::audio::Clock;

use crate::{ui::summary::render_summary, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen<C: Clock> {
    fn render(&self, app: &mut App<C>, f: &mut Frame);
}

/// Operating screen - receive pane, input fields and the contact log
pub struct OperatingScreen;

impl<C: Clock> Screen<C> for OperatingScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Summary screen - session statistics and troubled characters
pub struct SummaryScreen;

impl<C: Clock> Screen<C> for SummaryScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        render_summary(app, f);
    }
}

/// Screen for the given app state
pub fn current_screen<C: Clock>(state: &AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::Operating => Box::new(OperatingScreen),
        AppState::Summary => Box::new(SummaryScreen),
    }
}
