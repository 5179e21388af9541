use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Channel identifies one measured or derived component of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// horizontal intensity
    H,
    /// declination
    D,
    /// inclination
    I,
    /// vertical intensity
    Z,
    /// geographic north
    X,
    /// geographic east
    Y,
    /// observatory east
    E,
    /// scalar total field
    F,
    /// delta F, vector minus scalar total field
    G,
    /// three-hourly K index
    K,
}

impl Channel {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'H' => Some(Self::H),
            'D' => Some(Self::D),
            'I' => Some(Self::I),
            'Z' => Some(Self::Z),
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            'K' => Some(Self::K),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::H => 'H',
            Self::D => 'D',
            Self::I => 'I',
            Self::Z => 'Z',
            Self::X => 'X',
            Self::Y => 'Y',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::K => 'K',
        }
    }

    /// is_angle reports channels stored as angles (radians once decoded).
    pub fn is_angle(&self) -> bool {
        matches!(self, Self::D | Self::I)
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).ok_or_else(|| format!("unknown channel {}", s)),
            _ => Err(format!("unknown channel {}", s)),
        }
    }
}

/// parse_channels splits a comma separated list such as `H,D,Z,F`.
pub fn parse_channels(s: &str) -> Result<Vec<Channel>, String> {
    s.split(',')
        .filter(|x| !x.trim().is_empty())
        .map(Channel::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::channel::{parse_channels, Channel};

    #[test]
    fn test_parse_channels() {
        let channels = parse_channels("H, d,Z,G").unwrap();
        assert_eq!(channels, vec![Channel::H, Channel::D, Channel::Z, Channel::G]);
        assert!(parse_channels("H,Q").is_err());
        assert!(parse_channels("HD").is_err());
    }

    #[test]
    fn test_char_round_trip() {
        for c in "HDIZXYEFGK".chars() {
            let channel = Channel::from_char(c).unwrap();
            assert_eq!(channel.as_char(), c);
        }
        assert_eq!(Channel::from_char(' '), None);
    }
}
