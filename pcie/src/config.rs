//! Board-supplied bring-up parameters

use error::Errno;

/// Sizes and addresses used when programming windows and BARs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    ep_memory_base: u64,
    ep_bar_sizes: [u64; 4],
    ep_outbound_size: u64,
    ep_function: u8,
    rc_inbound_size: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKey {
    /// Local memory the Endpoint BARs are backed by
    EpMemoryBase,
    EpBar0Size,
    EpBar1Size,
    EpBar2Size,
    /// Size of the fourth BAR slot, which is BAR4 of the header
    EpBar4Size,
    /// Size of the Endpoint outbound memory window
    EpOutboundSize,
    /// Physical function whose BARs get inbound windows
    EpFunction,
    /// Size of the Root Complex catch-all inbound window
    RcInboundSize,
}

impl ConfigKey {
    /// Looks up a key by its option name, e.g. `ep-bar0-size`
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ep-memory-base" => Self::EpMemoryBase,
            "ep-bar0-size" => Self::EpBar0Size,
            "ep-bar1-size" => Self::EpBar1Size,
            "ep-bar2-size" => Self::EpBar2Size,
            "ep-bar4-size" => Self::EpBar4Size,
            "ep-outbound-size" => Self::EpOutboundSize,
            "ep-function" => Self::EpFunction,
            "rc-inbound-size" => Self::RcInboundSize,
            _ => return None,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            ep_memory_base: 0x8040_0000,
            ep_bar_sizes: [4 << 10, 8 << 10, 4 << 10, 1 << 20],
            ep_outbound_size: 1 << 30,
            ep_function: 1,
            rc_inbound_size: 1 << 40,
        }
    }

    pub fn set_u64(&mut self, key: ConfigKey, value: u64) -> Result<(), Errno> {
        match key {
            ConfigKey::EpMemoryBase => self.ep_memory_base = value,
            ConfigKey::EpBar0Size => self.ep_bar_sizes[0] = value,
            ConfigKey::EpBar1Size => self.ep_bar_sizes[1] = value,
            ConfigKey::EpBar2Size => self.ep_bar_sizes[2] = value,
            ConfigKey::EpBar4Size => self.ep_bar_sizes[3] = value,
            ConfigKey::EpOutboundSize => self.ep_outbound_size = value,
            ConfigKey::EpFunction => {
                if value > 7 {
                    return Err(Errno::InvalidArgument);
                }
                self.ep_function = value as u8;
            }
            ConfigKey::RcInboundSize => self.rc_inbound_size = value,
        }
        Ok(())
    }

    pub fn get_u64(&self, key: ConfigKey) -> u64 {
        match key {
            ConfigKey::EpMemoryBase => self.ep_memory_base,
            ConfigKey::EpBar0Size => self.ep_bar_sizes[0],
            ConfigKey::EpBar1Size => self.ep_bar_sizes[1],
            ConfigKey::EpBar2Size => self.ep_bar_sizes[2],
            ConfigKey::EpBar4Size => self.ep_bar_sizes[3],
            ConfigKey::EpOutboundSize => self.ep_outbound_size,
            ConfigKey::EpFunction => self.ep_function as u64,
            ConfigKey::RcInboundSize => self.rc_inbound_size,
        }
    }

    /// Applies a `name=value` option, value in decimal or `0x` hex
    pub fn set_option(&mut self, option: &str) -> Result<(), Errno> {
        let (name, value) = option.split_once('=').ok_or(Errno::InvalidArgument)?;
        let key = ConfigKey::from_name(name.trim()).ok_or(Errno::DoesNotExist)?;
        let value = parse_number(value.trim()).ok_or(Errno::InvalidArgument)?;
        self.set_u64(key, value)
    }

    #[inline]
    pub const fn ep_memory_base(&self) -> u64 {
        self.ep_memory_base
    }

    /// Sizes of the four Endpoint BAR slots
    #[inline]
    pub const fn ep_bar_sizes(&self) -> [u64; 4] {
        self.ep_bar_sizes
    }

    #[inline]
    pub const fn ep_outbound_size(&self) -> u64 {
        self.ep_outbound_size
    }

    #[inline]
    pub const fn ep_function(&self) -> u8 {
        self.ep_function
    }

    #[inline]
    pub const fn rc_inbound_size(&self) -> u64 {
        self.rc_inbound_size
    }
}

fn parse_number(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
