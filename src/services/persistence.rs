use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{
    configuration::OutputSettings,
    domain::{listing::Listing, search::SearchParameters},
};

/// Where finished runs end up.
pub trait ResultSink: Send + Sync {
    /// Returns the files written, in write order.
    fn persist(
        &self,
        listings: &[Listing],
        params: &SearchParameters,
    ) -> anyhow::Result<Vec<PathBuf>>;
}

#[derive(Serialize)]
struct JsonReport<'a> {
    search: &'a SearchParameters,
    scraped_at: DateTime<Local>,
    count: usize,
    jobs: &'a [Listing],
}

/// Writes `jobs_<timestamp>.{csv,json}` and `jobs_<timestamp>_summary.txt`.
pub struct FileSink {
    output: OutputSettings,
}

impl FileSink {
    pub fn new(output: OutputSettings) -> Self {
        FileSink { output }
    }

    pub fn persist_at(
        &self,
        listings: &[Listing],
        params: &SearchParameters,
        now: DateTime<Local>,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let directory = &self.output.directory;
        fs::create_dir_all(directory)
            .with_context(|| format!("Failed to create output directory {:?}", directory))?;

        let stem = format!("jobs_{}", now.format("%Y%m%d_%H%M%S"));
        let mut written = vec![];

        if self.output.write_csv {
            let path = directory.join(format!("{}.csv", stem));
            write_csv(&path, listings)
                .with_context(|| format!("Failed to write {:?}", path))?;
            written.push(path);
        }

        if self.output.write_json {
            let path = directory.join(format!("{}.json", stem));
            let report = JsonReport {
                search: params,
                scraped_at: now,
                count: listings.len(),
                jobs: listings,
            };
            let file =
                File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, &report)
                .with_context(|| format!("Failed to write {:?}", path))?;
            w.flush()?;
            written.push(path);
        }

        if self.output.write_summary {
            let path = directory.join(format!("{}_summary.txt", stem));
            write_summary(&path, listings, params)
                .with_context(|| format!("Failed to write {:?}", path))?;
            written.push(path);
        }

        for path in written.iter() {
            log::info!("Saved {} listings to {:?}", listings.len(), path);
        }
        Ok(written)
    }
}

impl ResultSink for FileSink {
    fn persist(
        &self,
        listings: &[Listing],
        params: &SearchParameters,
    ) -> anyhow::Result<Vec<PathBuf>> {
        self.persist_at(listings, params, Local::now())
    }
}

/// One CSV line. Field order and renames fix the column header.
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Company")]
    company: &'a str,
    #[serde(rename = "Experience")]
    experience: &'a str,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Rating")]
    rating: &'a str,
    #[serde(rename = "Posted Date")]
    posted_date: &'a str,
    #[serde(rename = "Skills")]
    skills: String,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Link")]
    link: &'a str,
    #[serde(rename = "Id")]
    id: &'a str,
}

impl<'a> From<&'a Listing> for CsvRow<'a> {
    fn from(listing: &'a Listing) -> Self {
        CsvRow {
            title: &listing.title,
            company: &listing.company,
            experience: &listing.experience,
            location: &listing.location,
            rating: &listing.rating,
            posted_date: &listing.posted_date,
            skills: listing.skills_line(),
            description: &listing.description,
            link: &listing.detail_link,
            id: &listing.external_id,
        }
    }
}

fn write_csv(path: &Path, listings: &[Listing]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)?;

    for listing in listings {
        writer.serialize(CsvRow::from(listing))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_summary(path: &Path, listings: &[Listing], params: &SearchParameters) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    writeln!(w, "JOB SEARCH RESULTS")?;
    writeln!(w, "{}", "=".repeat(50))?;
    writeln!(
        w,
        "Keywords: {} | Location: {} | Experience: {} years",
        params.keywords(),
        match params.location().is_empty() {
            true => "any",
            false => params.location(),
        },
        params.experience_years()
    )?;
    writeln!(w, "Listings: {}", listings.len())?;
    writeln!(w)?;

    for (i, job) in listings.iter().enumerate() {
        writeln!(w, "Job {}:", i + 1)?;
        writeln!(w, "  Title: {}", job.title)?;
        writeln!(w, "  Company: {}", job.company)?;
        writeln!(w, "  Experience: {}", job.experience)?;
        writeln!(w, "  Location: {}", job.location)?;
        writeln!(w, "  Rating: {}", job.rating)?;
        writeln!(w, "  Posted: {}", job.posted_date)?;
        writeln!(w, "  Skills: {}", job.skills_line())?;
        writeln!(w, "  Link: {}", job.detail_link)?;
        writeln!(w, "  Job ID: {}", job.external_id)?;
        writeln!(w, "{}", "-".repeat(30))?;
        writeln!(w)?;
    }
    w.flush()
}
