//! G-code driver for the Ender 5 gantry that positions objects in the tank.
//!
//! The gantry speaks line-oriented G-code (Marlin firmware): every command
//! is terminated with `\r\n` and acknowledged with an `ok` line. The driver
//! works over any byte stream implementing [`Read`] + [`Write`], which is a
//! serial port on the rig and an in-memory buffer in tests.
//!
//! Coordinates are handed to the driver in the tank frame (origin on the
//! tank axis at the floor) and translated to absolute gantry coordinates by
//! a [`GantryFrame`].

use std::io::{BufRead, BufReader, Read, Write};

use log::{debug, info};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::config::GANTRY_CENTER;
use crate::error::{GridError, Result};


/// Commands understood by the gantry firmware.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveX(f64),
    MoveY(f64),
    MoveZ(f64),
    MoveXY(f64, f64),
    /// Home x/y first, then z.
    Home,
    EnableSteppers,
    DisableSteppers,
    FanOff,
    ReadTemperature,
}

impl Command {
    /// G-code lines for this command, each terminated with `\r\n`.
    pub fn lines(&self, feed: f64) -> Vec<String> {
        match self {
            Command::MoveX(x) => vec![format!("G0 X{} F{}\r\n", x, feed)],
            Command::MoveY(y) => vec![format!("G0 Y{} F{}\r\n", y, feed)],
            Command::MoveZ(z) => vec![format!("G0 Z{} F{}\r\n", z, feed)],
            Command::MoveXY(x, y) => vec![format!("G0 X{} Y{} F{}\r\n", x, y, feed)],
            Command::Home => vec![
                format!("G28 X0 Y0 F{}\r\n", feed),
                format!("G28 Z0 F{}\r\n", feed),
            ],
            Command::EnableSteppers => vec!["M17 X Y Z E\r\n".to_string()],
            Command::DisableSteppers => vec!["M18 X Y Z E\r\n".to_string()],
            Command::FanOff => vec!["M106 S0\r\n".to_string()],
            Command::ReadTemperature => vec!["M105\r\n".to_string()],
        }
    }

    pub fn to_gcode(&self, feed: f64) -> String {
        self.lines(feed).concat()
    }
}

/// Position and targets of the gantry head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ender5Stat {
    pub abs_x_pos: f64,
    pub abs_y_pos: f64,
    pub abs_z_pos: f64,
    pub tank_architecture: Option<String>,
    /// Feed rate in mm/min.
    pub motion_speed: f64,
    pub abs_x_tgt: Option<f64>,
    pub abs_y_tgt: Option<f64>,
    pub abs_z_tgt: Option<f64>,
}

impl Ender5Stat {
    pub fn new(motion_speed: f64) -> Self {
        Self {
            abs_x_pos: 0.0,
            abs_y_pos: 0.0,
            abs_z_pos: 0.0,
            tank_architecture: None,
            motion_speed,
            abs_x_tgt: None,
            abs_y_tgt: None,
            abs_z_tgt: None,
        }
    }
}

/// Placement of the tank frame inside the gantry's absolute frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GantryFrame {
    /// Gantry x of the tank axis.
    pub center_x: f64,
    /// Gantry y of the tank axis.
    pub center_y: f64,
    /// Gantry z of the tank floor.
    pub z_origin: f64,
}

impl Default for GantryFrame {
    fn default() -> Self {
        Self {
            center_x: GANTRY_CENTER.0,
            center_y: GANTRY_CENTER.1,
            z_origin: 0.0,
        }
    }
}

impl GantryFrame {
    pub fn to_gantry(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::new(
            self.center_x + point.x,
            self.center_y + point.y,
            self.z_origin + point.z,
        )
    }

    pub fn to_tank(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::new(
            point.x - self.center_x,
            point.y - self.center_y,
            point.z - self.z_origin,
        )
    }
}

/// Extracts the bed temperature from an `M105` reply such as `ok T:21.4 /0.0 B:22.8 /0.0`.
pub fn parse_temperature(line: &str) -> Result<f64> {
    let field = line
        .split("B:")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or_else(|| GridError::Protocol(format!("no bed temperature in '{}'", line.trim())))?;
    field
        .parse::<f64>()
        .map_err(|_| GridError::Protocol(format!("bad bed temperature '{}'", field)))
}

/// Blocking driver over a G-code byte stream.
pub struct Gantry<S: Read + Write> {
    port: BufReader<S>,
    frame: GantryFrame,
    stat: Ender5Stat,
}

impl<S: Read + Write> Gantry<S> {
    pub fn new(stream: S, frame: GantryFrame, motion_speed: f64) -> Self {
        Self {
            port: BufReader::new(stream),
            frame,
            stat: Ender5Stat::new(motion_speed),
        }
    }

    pub fn stat(&self) -> &Ender5Stat {
        &self.stat
    }

    pub fn frame(&self) -> &GantryFrame {
        &self.frame
    }

    pub fn into_inner(self) -> S {
        self.port.into_inner()
    }

    fn read_reply_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.port.read_line(&mut line)? == 0 {
            return Err(GridError::Protocol(
                "connection closed while waiting for the gantry".to_string(),
            ));
        }
        debug!("<- {}", line.trim_end());
        Ok(line.trim_end().to_string())
    }

    /// Writes one command and blocks until each of its lines is acknowledged.
    ///
    /// Returns the non-`ok` lines received in between.
    pub fn send(&mut self, command: &Command) -> Result<Vec<String>> {
        let mut replies = Vec::new();
        for line in command.lines(self.stat.motion_speed) {
            debug!("-> {}", line.trim_end());
            let stream = self.port.get_mut();
            stream.write_all(line.as_bytes())?;
            stream.flush()?;
            loop {
                let reply = self.read_reply_line()?;
                if reply == "ok" {
                    break;
                }
                replies.push(reply);
            }
        }
        Ok(replies)
    }

    pub fn run_program(&mut self, program: &[Command]) -> Result<()> {
        for command in program {
            self.send(command)?;
        }
        Ok(())
    }

    pub fn enable_steppers(&mut self) -> Result<()> {
        self.send(&Command::EnableSteppers).map(|_| ())
    }

    pub fn disable_steppers(&mut self) -> Result<()> {
        self.send(&Command::DisableSteppers).map(|_| ())
    }

    pub fn home(&mut self) -> Result<()> {
        self.send(&Command::Home)?;
        self.stat.abs_x_pos = 0.0;
        self.stat.abs_y_pos = 0.0;
        self.stat.abs_z_pos = 0.0;
        Ok(())
    }

    /// Moves x/y onto the tank axis, leaving z untouched.
    pub fn center(&mut self) -> Result<()> {
        let (x, y) = (self.frame.center_x, self.frame.center_y);
        self.send(&Command::MoveXY(x, y))?;
        self.stat.abs_x_pos = x;
        self.stat.abs_y_pos = y;
        Ok(())
    }

    pub fn init_axis(&mut self) -> Result<()> {
        self.home()?;
        self.center()?;
        self.send(&Command::FanOff)?;
        info!(
            "X,Y axis are centered at X({}), Y({})",
            self.frame.center_x, self.frame.center_y
        );
        Ok(())
    }

    /// Moves to a tank-frame point: x/y first, then z.
    pub fn move_to(&mut self, point: &Point3<f64>) -> Result<()> {
        let target = self.frame.to_gantry(point);
        self.stat.abs_x_tgt = Some(target.x);
        self.stat.abs_y_tgt = Some(target.y);
        self.stat.abs_z_tgt = Some(target.z);

        self.send(&Command::MoveXY(target.x, target.y))?;
        self.stat.abs_x_pos = target.x;
        self.stat.abs_y_pos = target.y;
        self.send(&Command::MoveZ(target.z))?;
        self.stat.abs_z_pos = target.z;
        debug!("{:?}", self.stat);
        Ok(())
    }

    /// Polls the bed temperature with `M105`.
    pub fn read_temperature(&mut self) -> Result<f64> {
        let stream = self.port.get_mut();
        stream.write_all(Command::ReadTemperature.to_gcode(self.stat.motion_speed).as_bytes())?;
        stream.flush()?;
        loop {
            let reply = self.read_reply_line()?;
            if reply.contains("B:") {
                return parse_temperature(&reply);
            }
            if reply == "ok" {
                return Err(GridError::Protocol(
                    "M105 acknowledged without a bed temperature".to_string(),
                ));
            }
        }
    }
}
