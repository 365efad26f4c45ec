/*
    System utility functions

    (File I/O, JSON serialization, system time.)
*/

use serde::ser::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time::macros::format_description;
use time::OffsetDateTime;

fn path_writer<P>(path: P) -> BufWriter<File>
where
    P: AsRef<Path> + Debug,
{
    BufWriter::new(File::create(&path).unwrap_or_else(|err| {
        panic!("Could not open file for writing: {:?} -- {}", path, err)
    }))
}

pub fn file_exists<P>(path: P) -> bool
where
    P: AsRef<Path> + Debug,
{
    path.as_ref().exists()
}

pub fn to_json_file<P, T>(path: P, data: T)
where
    P: AsRef<Path> + Debug,
    T: Serialize,
{
    let mut writer = path_writer(&path);
    serde_json::to_writer_pretty(&mut writer, &data).unwrap_or_else(|err| {
        panic!("Could not write JSON to {:?} -- {}", path, err)
    });
    writeln!(&mut writer).unwrap_or_else(|err| {
        panic!("Could not append newline to file: {:?} -- {}", path, err)
    });
}

// Current datetime (UTC) for use in file names
pub fn current_datetime_str() -> String {
    let format =
        format_description!("[year]-[month]-[day]-[hour][minute][second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|err| panic!("Could not format datetime: {}", err))
}
