//! Error types for the touch driver.

use core::fmt::{self, Debug};

/// The main error type for the touch driver.
///
/// "No touch" is not an error: reads report it as `Ok(None)`.
pub enum Error<TBUSERR> {
    /// The bus transport failed.
    Bus(TBUSERR),
    /// The active calibration has a zero span on at least one axis.
    IllegalCalibration,
    /// The pressure readings never settled within the configured bound.
    SensorUnstable,
    /// A calibration corner was not touched (or not released) in time.
    CalibrationTimeout,
}

impl<TBUSERR: Debug> Debug for Error<TBUSERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::IllegalCalibration => write!(f, "IllegalCalibration"),
            Self::SensorUnstable => write!(f, "SensorUnstable"),
            Self::CalibrationTimeout => write!(f, "CalibrationTimeout"),
        }
    }
}

impl<TBUSERR: PartialEq> PartialEq for Error<TBUSERR> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bus(a), Self::Bus(b)) => a == b,
            (Self::IllegalCalibration, Self::IllegalCalibration)
            | (Self::SensorUnstable, Self::SensorUnstable)
            | (Self::CalibrationTimeout, Self::CalibrationTimeout) => true,
            _ => false,
        }
    }
}

/// Error raised by the applied calibration transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalCalibration;

impl<TBUSERR> From<IllegalCalibration> for Error<TBUSERR> {
    fn from(_: IllegalCalibration) -> Self {
        Error::IllegalCalibration
    }
}

/// An error raised while deriving a calibration interactively.
pub enum CalibrationError<TBUSERR, TDRAWERR> {
    /// Sampling the touch controller failed.
    Touch(Error<TBUSERR>),
    /// Drawing a corner prompt failed.
    Draw(TDRAWERR),
}

impl<TBUSERR: Debug, TDRAWERR: Debug> Debug for CalibrationError<TBUSERR, TDRAWERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Touch(err) => write!(f, "Touch({err:?})"),
            Self::Draw(err) => write!(f, "Draw({err:?})"),
        }
    }
}

impl<TBUSERR, TDRAWERR> From<Error<TBUSERR>> for CalibrationError<TBUSERR, TDRAWERR> {
    fn from(err: Error<TBUSERR>) -> Self {
        CalibrationError::Touch(err)
    }
}
