use common_base::interval::Interval;
use common_base::{Error, Result};
use geomag_utils::time::strftime;

pub const FILE_SCHEME: &str = "file://";

/// UrlTemplate expands `%(name)s` patterns into a location for one file.
///
/// - `%(OBS)s` / `%(obs)s` upper / lowercase observatory code
/// - `%(ym)s` year and month as `YYYYMM`
/// - `%(year)s` year as `YYYY`
/// - `%(julian)s` day of year as `DDD`
/// - `%(ymd)s` date as `YYYYMMDD`
/// - `%(yb)s` two digit year and lowercase month abbreviation, e.g. `15jan`
/// - `%(i)s` interval abbreviation, e.g. `min`
/// - `%(t)s` data type abbreviation, e.g. `d` for definitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        self.template.as_str()
    }

    pub fn is_file(&self) -> bool {
        self.template.starts_with(FILE_SCHEME)
    }

    pub fn render(
        &self,
        observatory: &str,
        date: i64,
        data_type: &str,
        interval: Interval,
    ) -> Result<String> {
        let mut out = String::with_capacity(self.template.len() + 16);
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find("%(") {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 2..];
            let close = after
                .find(")s")
                .ok_or_else(|| Error::UnsupportedUrl(self.template.clone()))?;
            let key = &after[..close];
            let value = match key {
                "OBS" => observatory.to_uppercase(),
                "obs" => observatory.to_lowercase(),
                "ym" => strftime(date, "%Y%m"),
                "year" => strftime(date, "%Y"),
                "julian" => strftime(date, "%j"),
                "ymd" => strftime(date, "%Y%m%d"),
                "yb" => strftime(date, "%y%b").to_lowercase(),
                "i" => interval.abbreviation().to_string(),
                "t" => type_abbreviation(data_type)?.to_string(),
                _ => return Err(Error::UnsupportedUrl(self.template.clone())),
            };
            out.push_str(value.as_str());
            rest = &after[close + 2..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

fn type_abbreviation(data_type: &str) -> Result<&'static str> {
    match data_type {
        "definitive" => Ok("d"),
        "provisional" => Ok("p"),
        "quasi-definitive" => Ok("q"),
        "variation" => Ok("v"),
        _ => Err(Error::UnsupportedUrl(format!(
            "unexpected data type \"{}\"",
            data_type
        ))),
    }
}

/// file_path strips the `file://` scheme, failing for any other location.
pub fn file_path(url: &str) -> Result<String> {
    url.strip_prefix(FILE_SCHEME)
        .map(|p| p.to_string())
        .ok_or_else(|| Error::UnsupportedUrl(url.to_string()))
}
