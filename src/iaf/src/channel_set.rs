use common_base::channel::Channel;
use common_base::{Error, Result};

use crate::record::GROUP_CHANNELS;

/// ChannelSet names the four channel slots of a record, read from the header's
/// channel code. A slot is `None` when the code names fewer than four channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSet {
    slots: [Option<Channel>; GROUP_CHANNELS],
}

impl ChannelSet {
    pub fn parse(code: &str) -> Result<Self> {
        let mut slots = [None; GROUP_CHANNELS];
        for (i, c) in code.trim().chars().enumerate() {
            if i >= GROUP_CHANNELS {
                return Err(Error::MalformedRecord(format!(
                    "channel code \"{}\" names more than {} channels",
                    code, GROUP_CHANNELS
                )));
            }
            slots[i] = Some(Channel::from_char(c).ok_or_else(|| {
                Error::MalformedRecord(format!("unknown channel {:?} in code \"{}\"", c, code))
            })?);
        }
        Ok(Self { slots })
    }

    pub fn from_channels(channels: &[Channel]) -> Result<Self> {
        if channels.len() != GROUP_CHANNELS {
            return Err(Error::InvalidChannelCount(format!(
                "got {} output channels {:?}, exp {}",
                channels.len(),
                channels,
                GROUP_CHANNELS
            )));
        }
        let mut slots = [None; GROUP_CHANNELS];
        for (slot, channel) in slots.iter_mut().zip(channels) {
            *slot = Some(*channel);
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[Option<Channel>; GROUP_CHANNELS] {
        &self.slots
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.slots.iter().flatten().copied().collect()
    }

    /// vector returns the first three channels.
    pub fn vector(&self) -> [Option<Channel>; 3] {
        [self.slots[0], self.slots[1], self.slots[2]]
    }

    pub fn fourth(&self) -> Option<Channel> {
        self.slots[3]
    }

    pub fn code(&self) -> String {
        self.channels().iter().map(|c| c.as_char()).collect()
    }
}

/// ChannelSeries maps channels to their samples, keeping insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSeries {
    entries: Vec<(Channel, Vec<f64>)>,
}

impl ChannelSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert replaces the samples of an existing channel or appends a new one.
    pub fn insert(&mut self, channel: Channel, values: Vec<f64>) {
        match self.get_mut(channel) {
            Some(v) => *v = values,
            None => self.entries.push((channel, values)),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&Vec<f64>> {
        self.entries
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, channel: Channel) -> Option<&mut Vec<f64>> {
        self.entries
            .iter_mut()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, channel: Channel) -> Option<Vec<f64>> {
        let i = self.entries.iter().position(|(c, _)| *c == channel)?;
        Some(self.entries.remove(i).1)
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.get(channel).is_some()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.entries.iter().map(|(c, _)| *c).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &Vec<f64>)> {
        self.entries.iter().map(|(c, v)| (*c, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ChannelSeries {
    type Item = (Channel, Vec<f64>);
    type IntoIter = std::vec::IntoIter<(Channel, Vec<f64>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use common_base::channel::Channel;

    use crate::channel_set::{ChannelSeries, ChannelSet};

    #[test]
    fn test_parse_channel_set() {
        let set = ChannelSet::parse("XYZG").unwrap();
        assert_eq!(set.code(), "XYZG");
        assert_eq!(set.fourth(), Some(Channel::G));
        assert_eq!(
            set.vector(),
            [Some(Channel::X), Some(Channel::Y), Some(Channel::Z)]
        );

        let set = ChannelSet::parse("HDZ").unwrap();
        assert_eq!(set.fourth(), None);
        assert_eq!(set.channels().len(), 3);

        assert!(ChannelSet::parse("HDZFG").is_err());
        assert!(ChannelSet::parse("HQZF").is_err());
        assert!(ChannelSet::from_channels(&[Channel::H, Channel::D]).is_err());
    }

    #[test]
    fn test_channel_series() {
        let mut series = ChannelSeries::new();
        series.insert(Channel::H, vec![1.0]);
        series.insert(Channel::Z, vec![2.0]);
        series.insert(Channel::H, vec![3.0]);
        assert_eq!(series.channels(), vec![Channel::H, Channel::Z]);
        assert_eq!(series.get(Channel::H), Some(&vec![3.0]));

        assert_eq!(series.remove(Channel::Z), Some(vec![2.0]));
        assert!(!series.contains(Channel::Z));
        assert_eq!(series.len(), 1);
    }
}
