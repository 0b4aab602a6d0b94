use ::csv::Writer;

use crate::error::Result;
use crate::model::DuplicateHostKey;

pub fn render_csv(duplicates: &[DuplicateHostKey]) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());

    wtr.write_record(["Fingerprint", "Hosts"])?;
    for dup in duplicates {
        let hosts = dup.hosts.join(";");
        wtr.write_record([dup.fingerprint.as_str(), hosts.as_str()])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ::csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
