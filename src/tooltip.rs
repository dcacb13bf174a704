//! The single shared hover tooltip. Opacity is the only visibility signal.

use crate::render::js_number;
use crate::types::EducationRecord;
use serde::Serialize;

pub const VISIBLE_OPACITY: f64 = 0.9;
pub const OFFSET_X: f64 = 5.0;
pub const OFFSET_Y: f64 = -28.0;

/// Tooltip line for a joined county, e.g. `Autauga County, AL: 21.4%`.
pub fn tooltip_text(record: &EducationRecord) -> String {
    format!(
        "{}, {}: {}%",
        record.area_name,
        record.state,
        js_number(record.bachelors_or_higher)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TooltipState {
    pub opacity: f64,
    pub text: String,
    pub data_education: Option<f64>,
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Default)]
pub struct TooltipController {
    state: TooltipState,
}

impl TooltipController {
    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    /// Pointer entered a county. Without a joined record nothing changes, so a
    /// tooltip left visible by a previous county stays as it was.
    pub fn pointer_enter(&mut self, record: Option<&EducationRecord>, page_x: f64, page_y: f64) {
        let Some(record) = record else {
            return;
        };
        self.state = TooltipState {
            opacity: VISIBLE_OPACITY,
            text: tooltip_text(record),
            data_education: Some(record.bachelors_or_higher),
            left: page_x + OFFSET_X,
            top: page_y + OFFSET_Y,
        };
    }

    pub fn pointer_leave(&mut self) {
        self.state.opacity = 0.0;
    }
}

/// Turns a stream of pointer positions into enter/leave events for one
/// pointer. `target` is the county under the pointer (by render index) and
/// its joined record, if any.
#[derive(Debug, Default)]
pub struct HoverSession {
    hovered: Option<usize>,
    tooltip: TooltipController,
}

impl HoverSession {
    pub fn pointer_move(
        &mut self,
        target: Option<(usize, Option<&EducationRecord>)>,
        page_x: f64,
        page_y: f64,
    ) -> &TooltipState {
        let next = target.map(|(index, _)| index);
        if next != self.hovered {
            if self.hovered.is_some() {
                self.tooltip.pointer_leave();
            }
            if let Some((_, record)) = target {
                self.tooltip.pointer_enter(record, page_x, page_y);
            }
            self.hovered = next;
        }
        self.tooltip.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn autauga() -> EducationRecord {
        EducationRecord {
            fips: 1001,
            state: "AL".to_string(),
            area_name: "Autauga County".to_string(),
            bachelors_or_higher: 21.4,
        }
    }

    #[test]
    fn starts_hidden() {
        let controller = TooltipController::default();
        assert_eq!(controller.state().opacity, 0.0);
        assert!(controller.state().text.is_empty());
    }

    #[test]
    fn enter_shows_record_near_pointer() {
        let mut controller = TooltipController::default();
        controller.pointer_enter(Some(&autauga()), 100.0, 200.0);

        let state = controller.state();
        assert_eq!(state.opacity, 0.9);
        assert_eq!(state.text, "Autauga County, AL: 21.4%");
        assert_eq!(state.data_education, Some(21.4));
        assert_eq!(state.left, 105.0);
        assert_eq!(state.top, 172.0);
    }

    #[test]
    fn enter_without_record_keeps_previous_state() {
        let mut controller = TooltipController::default();
        controller.pointer_enter(Some(&autauga()), 10.0, 50.0);
        let before = controller.state().clone();

        controller.pointer_enter(None, 400.0, 400.0);
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn leave_only_hides() {
        let mut controller = TooltipController::default();
        controller.pointer_enter(Some(&autauga()), 10.0, 50.0);
        controller.pointer_leave();

        let state = controller.state();
        assert_eq!(state.opacity, 0.0);
        assert_eq!(state.text, "Autauga County, AL: 21.4%");
    }

    #[test]
    fn session_enters_and_leaves_counties() {
        let record = autauga();
        let mut session = HoverSession::default();

        let state = session.pointer_move(Some((0, Some(&record))), 10.0, 40.0);
        assert_eq!(state.opacity, 0.9);
        assert_eq!(state.left, 15.0);

        // Moving inside the same county fires nothing, so the tooltip stays put.
        let state = session.pointer_move(Some((0, Some(&record))), 60.0, 90.0);
        assert_eq!(state.left, 15.0);

        let state = session.pointer_move(None, 0.0, 0.0);
        assert_eq!(state.opacity, 0.0);
        assert_eq!(session.hovered, None);
    }

    #[test]
    fn moving_onto_unmatched_county_hides_previous_tooltip() {
        let record = autauga();
        let mut session = HoverSession::default();
        session.pointer_move(Some((0, Some(&record))), 10.0, 40.0);

        let state = session.pointer_move(Some((1, None)), 20.0, 40.0);
        assert_eq!(state.opacity, 0.0);
        assert_eq!(state.text, "Autauga County, AL: 21.4%");
    }

    #[test]
    fn whole_percentages_have_no_fraction() {
        let mut record = autauga();
        record.bachelors_or_higher = 30.0;
        assert_eq!(tooltip_text(&record), "Autauga County, AL: 30%");
    }
}
