// Probe geometry as CSV
// One "x,y" row per channel, no header

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::recording::ChannelLocation;

pub fn write_geom_csv(path: &Path, locations: &[ChannelLocation]) -> io::Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for loc in locations {
        writeln!(writer, "{},{}", loc.x, loc.y)?;
    }
    writer.flush()
}

pub fn read_geom_csv(path: &Path) -> io::Result<Vec<ChannelLocation>> {
    let contents = fs::read_to_string(path)?;
    let mut locations = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',').map(|f| f.trim().parse::<f64>());
        match (fields.next(), fields.next()) {
            (Some(Ok(x)), Some(Ok(y))) => locations.push(ChannelLocation::new(x, y)),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}:{}: expected \"x,y\"", path.display(), line_no + 1),
                ))
            }
        }
    }

    Ok(locations)
}
