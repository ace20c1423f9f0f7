#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn hhmm(self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    fn minutes(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Minute { big: bool },
    Hour,
}

pub fn clamp(n: i64, min: i64, max: i64) -> i64 {
    min.max(max.min(n))
}

pub fn parse_hhmm(text: &str) -> Option<TimeOfDay> {
    let (h, m) = text.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(TimeOfDay {
        hour: clamp(h.parse().ok()?, 0, 23) as u32,
        minute: clamp(m.parse().ok()?, 0, 59) as u32,
    })
}

pub fn normalize_time(text: &str) -> Option<String> {
    parse_hhmm(text).map(TimeOfDay::hhmm)
}

pub fn step(current: &str, direction: StepDirection, mode: StepMode) -> String {
    let time = parse_hhmm(current).unwrap_or(TimeOfDay { hour: 0, minute: 0 });
    match mode {
        StepMode::Minute { big } => {
            let delta = if big { 10 } else { 1 };
            let delta = match direction {
                StepDirection::Up => delta,
                StepDirection::Down => -delta,
            };
            let total = (time.minutes() + delta).rem_euclid(24 * 60);
            TimeOfDay {
                hour: (total / 60) as u32,
                minute: (total % 60) as u32,
            }
            .hhmm()
        }
        StepMode::Hour => {
            let delta = match direction {
                StepDirection::Up => 1,
                StepDirection::Down => -1,
            };
            TimeOfDay {
                hour: (i64::from(time.hour) + delta).rem_euclid(24) as u32,
                minute: time.minute,
            }
            .hhmm()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_one_or_two_digit_hours() {
        assert_eq!(parse_hhmm("9:30"), Some(TimeOfDay { hour: 9, minute: 30 }));
        assert_eq!(parse_hhmm("09:30"), Some(TimeOfDay { hour: 9, minute: 30 }));
        assert_eq!(parse_hhmm("23:59"), Some(TimeOfDay { hour: 23, minute: 59 }));
    }

    #[test]
    fn parse_clamps_out_of_range_components() {
        assert_eq!(parse_hhmm("25:30"), Some(TimeOfDay { hour: 23, minute: 30 }));
        assert_eq!(parse_hhmm("10:99"), Some(TimeOfDay { hour: 10, minute: 59 }));
    }

    #[test]
    fn parse_rejects_non_matching_input() {
        for text in ["", "9", "9:5", "123:00", "ab:cd", "9:30:00", "9.30"] {
            assert_eq!(parse_hhmm(text), None, "{text:?}");
        }
    }

    #[test]
    fn normalize_zero_pads() {
        assert_eq!(normalize_time("9:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_time(" 18:00 ").as_deref(), Some("18:00"));
        assert_eq!(normalize_time("nope"), None);
    }

    #[test]
    fn minute_step_carries_into_hour() {
        assert_eq!(step("10:59", StepDirection::Up, StepMode::Minute { big: false }), "11:00");
        assert_eq!(step("11:00", StepDirection::Down, StepMode::Minute { big: false }), "10:59");
        assert_eq!(step("09:55", StepDirection::Up, StepMode::Minute { big: true }), "10:05");
    }

    #[test]
    fn step_wraps_around_midnight() {
        assert_eq!(step("23:59", StepDirection::Up, StepMode::Minute { big: false }), "00:00");
        assert_eq!(step("00:00", StepDirection::Down, StepMode::Minute { big: false }), "23:59");
        assert_eq!(step("23:30", StepDirection::Up, StepMode::Hour), "00:30");
        assert_eq!(step("00:30", StepDirection::Down, StepMode::Hour), "23:30");
    }

    #[test]
    fn opposite_steps_round_trip() {
        for start in ["00:00", "09:41", "23:59"] {
            for mode in [
                StepMode::Minute { big: false },
                StepMode::Minute { big: true },
                StepMode::Hour,
            ] {
                let up = step(start, StepDirection::Up, mode);
                assert_eq!(step(&up, StepDirection::Down, mode), start);
            }
        }
    }

    #[test]
    fn step_treats_invalid_current_as_midnight() {
        assert_eq!(step("garbage", StepDirection::Up, StepMode::Minute { big: false }), "00:01");
    }
}
