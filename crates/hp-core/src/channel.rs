//! Hotplate channel identifiers.
//!
//! The board carries two independently addressable hotplates, HP1 and HP3.
//! Per-channel data lives in a [`ChannelMap`], which gives every channel its
//! own slot with O(1) lookup and no coupling to array position.

use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;

use crate::HpError;

/// One of the board's hotplates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Channel {
    Hp1,
    Hp3,
}

impl Channel {
    /// Every channel, in measurement order.
    pub const ALL: [Channel; 2] = [Channel::Hp1, Channel::Hp3];

    /// Board label as printed on the silkscreen.
    pub fn label(self) -> &'static str {
        match self {
            Channel::Hp1 => "HP1",
            Channel::Hp3 => "HP3",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Channel {
    type Err = HpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hp1" | "1" => Ok(Channel::Hp1),
            "hp3" | "3" => Ok(Channel::Hp3),
            _ => Err(HpError::UnknownChannel {
                name: s.to_string(),
            }),
        }
    }
}

/// Fixed mapping from [`Channel`] to a value, one slot per hotplate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMap<T> {
    pub hp1: T,
    pub hp3: T,
}

impl<T> ChannelMap<T> {
    pub const fn new(hp1: T, hp3: T) -> Self {
        Self { hp1, hp3 }
    }

    /// Build a map by evaluating `f` once per channel, in [`Channel::ALL`] order.
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        let hp1 = f(Channel::Hp1);
        let hp3 = f(Channel::Hp3);
        Self { hp1, hp3 }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Hp1 => &self.hp1,
            Channel::Hp3 => &self.hp3,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Hp1 => &mut self.hp1,
            Channel::Hp3 => &mut self.hp3,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        [(Channel::Hp1, &self.hp1), (Channel::Hp3, &self.hp3)].into_iter()
    }

    pub fn map<U>(self, mut f: impl FnMut(Channel, T) -> U) -> ChannelMap<U> {
        ChannelMap {
            hp1: f(Channel::Hp1, self.hp1),
            hp3: f(Channel::Hp3, self.hp3),
        }
    }
}

impl<T> Index<Channel> for ChannelMap<T> {
    type Output = T;

    fn index(&self, channel: Channel) -> &T {
        self.get(channel)
    }
}

impl<T> IndexMut<Channel> for ChannelMap<T> {
    fn index_mut(&mut self, channel: Channel) -> &mut T {
        self.get_mut(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_have_separate_slots() {
        let mut map = ChannelMap::new(0_u16, 0_u16);
        map[Channel::Hp1] = 7;
        assert_eq!(map[Channel::Hp1], 7);
        assert_eq!(map[Channel::Hp3], 0);
    }

    #[test]
    fn iter_follows_measurement_order() {
        let map = ChannelMap::from_fn(|ch| ch.label());
        let order: Vec<_> = map.iter().map(|(ch, _)| ch).collect();
        assert_eq!(order, Channel::ALL.to_vec());
    }

    #[test]
    fn parse_channel_names() {
        assert_eq!("hp1".parse::<Channel>(), Ok(Channel::Hp1));
        assert_eq!("HP3".parse::<Channel>(), Ok(Channel::Hp3));
        assert_eq!("3".parse::<Channel>(), Ok(Channel::Hp3));
        assert!("hp2".parse::<Channel>().is_err());
    }
}
