use std::{
    fs::File,
    io::{Read, Write},
    os::fd::AsRawFd,
    path::{Path, PathBuf},
};

use bitflags::bitflags;

use crate::error::Error;

/// highest valid 7-bit device address
pub const MAX_ADDRESS: u8 = 0x7f;

const I2C_SLAVE: libc::c_ulong = 0x0703;
const I2C_FUNCS: libc::c_ulong = 0x0705;

bitflags! {
    /// adapter capabilities as reported by the `I2C_FUNCS` ioctl
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Funcs: u64 {
        const I2C = 0x0000_0001;
        const TEN_BIT_ADDR = 0x0000_0002;
        const PROTOCOL_MANGLING = 0x0000_0004;
        const SMBUS_PEC = 0x0000_0008;
        const NOSTART = 0x0000_0010;
        const SMBUS_QUICK = 0x0001_0000;
        const SMBUS_READ_BYTE = 0x0002_0000;
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        const SMBUS_BYTE_DATA = 0x0018_0000;
        const SMBUS_WORD_DATA = 0x0060_0000;
        const SMBUS_I2C_BLOCK = 0x0c00_0000;
    }
}

/// a byte oriented two-wire bus bound to a single target device
pub trait Bus {
    /// bind all following transfers to the 7-bit `address`
    fn select(&mut self, address: u8) -> Result<(), Error>;

    /// write all of `bytes` as one transfer, a short write is an error
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;

    fn read_byte(&mut self) -> Result<u8, Error>;

    /// release the bus, calling this more than once is a no-op
    fn close(&mut self);
}

/// a bus opened through the linux i2c-dev character device
#[derive(Debug)]
pub struct I2cDev {
    path: PathBuf,
    file: Option<File>,
    funcs: Funcs,
    address: Option<u8>,
}

impl I2cDev {
    /// open `/dev/i2c-<bus_id>` and query the adapter capabilities
    pub fn open(bus_id: i32) -> Result<Self, Error> {
        if bus_id < 0 {
            Err(Error::InvalidBus(bus_id))?
        }
        Self::open_path(format!("/dev/i2c-{bus_id}"))
    }

    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| Error::BusUnavailable { path: path.clone(), source })?;

        let funcs = match query_funcs(&file) {
            Ok(funcs) => funcs,
            Err(err) => {
                log::warn!("unable to query functionality of {}: {err}", path.display());
                Funcs::empty()
            }
        };
        log::info!("opened {} ({})", path.display(), describe_funcs(funcs));

        Ok(Self { path, file: Some(file), funcs, address: None })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn funcs(&self) -> Funcs {
        self.funcs
    }

    /// currently selected device address
    pub fn address(&self) -> Option<u8> {
        self.address
    }

    fn file(&mut self) -> Result<&mut File, Error> {
        self.file.as_mut().ok_or(Error::HandleClosed)
    }
}

impl Bus for I2cDev {
    fn select(&mut self, address: u8) -> Result<(), Error> {
        if address > MAX_ADDRESS {
            Err(Error::AddressRejected {
                address,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "address is not a 7-bit address"),
            })?
        }
        let fd = self.file()?.as_raw_fd();
        // SAFETY: fd belongs to the open file owned by self and I2C_SLAVE takes the address by value
        let res = unsafe { libc::ioctl(fd, I2C_SLAVE as _, libc::c_ulong::from(address)) };
        if res < 0 {
            Err(Error::AddressRejected { address, source: std::io::Error::last_os_error() })?
        }
        log::debug!("selected device {address:#04x} on {}", self.path.display());
        self.address = Some(address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let len = bytes.len();
        let written = self.file()?.write(bytes).map_err(|source| Error::WriteFailed { len, source })?;
        if written != len {
            Err(Error::WriteFailed {
                len,
                source: std::io::Error::new(std::io::ErrorKind::WriteZero, format!("short write of {written} bytes")),
            })?
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut buf = [0_u8; 1];
        match self.file()?.read(&mut buf) {
            Ok(1) => Ok(buf[0]),
            Ok(_) => Err(Error::ReadFailed(std::io::ErrorKind::UnexpectedEof.into())),
            Err(err) => Err(Error::ReadFailed(err)),
        }
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            log::debug!("closed {}", self.path.display());
        }
        self.address = None;
    }
}

fn query_funcs(file: &File) -> std::io::Result<Funcs> {
    let mut funcs: libc::c_ulong = 0;
    // SAFETY: I2C_FUNCS writes a single unsigned long into the pointed to value
    let res = unsafe { libc::ioctl(file.as_raw_fd(), I2C_FUNCS as _, &mut funcs as *mut libc::c_ulong) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(Funcs::from_bits_truncate(funcs as u64))
}

fn describe_funcs(funcs: Funcs) -> String {
    let mut names = Vec::new();
    if funcs.contains(Funcs::I2C) {
        names.push("I2C_FUNC_I2C");
    }
    if funcs.contains(Funcs::SMBUS_BYTE) {
        names.push("I2C_FUNC_SMBUS_BYTE");
    }
    names.join(" ")
}
