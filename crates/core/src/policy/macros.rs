use super::Macro;

/// Prefix of generated macro names.
pub const MACRO_PREFIX: &str = "WORK_TIME_";

const START_DAY: u32 = 7;
const START_MONTH: u32 = 3;

/// Days per month in the schedule model.
///
/// This is NOT a real calendar: every month has 30 days and there are no
/// leap years. Existing expected outputs depend on this model, so keep it.
const MODEL_MONTH_DAYS: u32 = 30;

/// Name of the macro at `index` (0-based): `WORK_TIME_<index+1>`.
pub(crate) fn macro_name(index: usize) -> String {
    format!("{}{}", MACRO_PREFIX, index + 1)
}

/// Day and month of a generated schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub day: u32,
    pub month: u32,
}

impl CalendarCursor {
    /// Cursor for macro `index`, starting from March 7th.
    ///
    /// The rollover is a single step: `month += day / 30`, then
    /// `day = day % 30 + 1`. The month is never wrapped, so indices past the
    /// end of the year produce months above 12.
    pub fn for_index(index: usize) -> Self {
        let mut day = START_DAY + index as u32;
        let mut month = START_MONTH;

        if day > MODEL_MONTH_DAYS {
            month += day / MODEL_MONTH_DAYS;
            day = day % MODEL_MONTH_DAYS + 1;
        }

        Self { day, month }
    }

    /// Schedule expression: hours 9-18 on this day and month, every year.
    pub fn schedule(&self) -> String {
        format!("[ * * 9-18 {} {} * ]", self.day, self.month)
    }
}

/// Generates `WORK_TIME_1..WORK_TIME_n` schedule macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroSynthesizer;

impl MacroSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, count: usize) -> Vec<Macro> {
        (0..count)
            .map(|i| Macro {
                name: macro_name(i),
                value: CalendarCursor::for_index(i).schedule(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_one() {
        let macros = MacroSynthesizer::new().generate(1);
        assert_eq!(
            macros,
            vec![Macro {
                name: "WORK_TIME_1".to_string(),
                value: "[ * * 9-18 7 3 * ]".to_string(),
            }]
        );
    }

    #[test]
    fn test_no_rollover_up_to_day_30() {
        assert_eq!(
            CalendarCursor::for_index(23),
            CalendarCursor { day: 30, month: 3 }
        );
    }

    #[test]
    fn test_rollover_into_next_month() {
        // day 31 -> month 3 + 1, day 31 % 30 + 1
        assert_eq!(
            CalendarCursor::for_index(24),
            CalendarCursor { day: 2, month: 4 }
        );
        assert_eq!(
            CalendarCursor::for_index(52),
            CalendarCursor { day: 30, month: 4 }
        );
    }

    #[test]
    fn test_rollover_multiple_months_single_step() {
        // day 60 -> month 3 + 2, day 60 % 30 + 1
        assert_eq!(
            CalendarCursor::for_index(53),
            CalendarCursor { day: 1, month: 5 }
        );
        // day 106 -> month 3 + 3, day 17
        let cursor = CalendarCursor::for_index(99);
        assert_eq!(cursor, CalendarCursor { day: 17, month: 6 });
        assert_eq!(cursor.schedule(), "[ * * 9-18 17 6 * ]");
    }

    #[test]
    fn test_day_always_in_model_range() {
        for i in 0..1000 {
            let cursor = CalendarCursor::for_index(i);
            assert!((1..=30).contains(&cursor.day), "index {i}: {cursor:?}");
        }
    }

    #[test]
    fn test_names_unique_and_ordered() {
        let macros = MacroSynthesizer::new().generate(100);
        let names: HashSet<_> = macros.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names.len(), 100);
        assert_eq!(macros[0].name, "WORK_TIME_1");
        assert_eq!(macros[99].name, "WORK_TIME_100");
    }
}
