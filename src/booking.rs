pub const THEATRES: [&str; 3] = ["PVR", "INOX", "CINEMARC"];
pub const SHOW_LANGUAGES: [&str; 2] = ["Hindi", "English"];
pub const FORMATS: [&str; 2] = ["2D", "3D"];
pub const SHOWTIMES: [&str; 5] = ["9:00 AM", "12:00 PM", "3:00 PM", "6:00 PM", "9:00 PM"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatClass {
    Recliner,
    Prime,
    Classic,
}

impl SeatClass {
    pub fn for_row(row: char) -> Option<SeatClass> {
        match row {
            'H' | 'G' => Some(SeatClass::Recliner),
            'F' | 'E' | 'D' => Some(SeatClass::Prime),
            'C' | 'B' | 'A' => Some(SeatClass::Classic),
            _ => None,
        }
    }

    pub fn price(self) -> u32 {
        match self {
            SeatClass::Recliner => 300,
            SeatClass::Prime => 150,
            SeatClass::Classic => 100,
        }
    }

    pub fn seats_per_row(self) -> u32 {
        match self {
            SeatClass::Recliner => 5,
            SeatClass::Prime | SeatClass::Classic => 10,
        }
    }
}

/// Splits a seat id like "F7" into its class and number, rejecting numbers
/// outside the row's layout.
pub fn parse_seat(seat: &str) -> Option<(SeatClass, u32)> {
    let row = seat.chars().next()?;
    let class = SeatClass::for_row(row)?;
    let number: u32 = seat[row.len_utf8()..].parse().ok()?;
    if number == 0 || number > class.seats_per_row() {
        return None;
    }
    Some((class, number))
}

pub fn valid_seat(seat: &str) -> bool {
    parse_seat(seat).is_some()
}

// Pricing goes by row class alone, the seat number does not matter.
pub fn total_price<S: AsRef<str>>(seats: &[S]) -> u32 {
    seats
        .iter()
        .filter_map(|s| SeatClass::for_row(s.as_ref().chars().next()?))
        .map(SeatClass::price)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_by_row_class() {
        assert_eq!(total_price(&["H1", "F2", "A10"]), 550);
        assert_eq!(total_price(&["G5", "G4"]), 600);
    }

    #[test]
    fn unknown_rows_price_nothing() {
        assert_eq!(total_price(&["Z1", "D3"]), 150);
        assert_eq!(total_price::<&str>(&[]), 0);
    }

    #[test]
    fn seat_validation() {
        assert!(valid_seat("H5"));
        assert!(!valid_seat("H6"));
        assert!(valid_seat("F10"));
        assert!(!valid_seat("F11"));
        assert!(!valid_seat("A0"));
        assert!(!valid_seat("J1"));
        assert!(!valid_seat("A"));
        assert!(!valid_seat(""));
    }

    #[test]
    fn parse_splits_class_and_number() {
        assert_eq!(parse_seat("D10"), Some((SeatClass::Prime, 10)));
        assert_eq!(parse_seat("H3"), Some((SeatClass::Recliner, 3)));
        assert_eq!(parse_seat("C7"), Some((SeatClass::Classic, 7)));
        assert_eq!(parse_seat("7C"), None);
    }
}
