use serde::Serialize;
use thiserror::Error;

const MAX_EXPERIENCE_YEARS: u8 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("keywords must not be empty")]
    EmptyKeywords,
    #[error("max records must be greater than zero")]
    ZeroMaxRecords,
    #[error("experience must be between 0 and 30 years, got {0}")]
    ExperienceOutOfRange(u8),
}

/// One search invocation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParameters {
    keywords: String,
    location: String,
    experience_years: u8,
    max_records: usize,
}

impl SearchParameters {
    pub fn new(
        keywords: &str,
        location: &str,
        experience_years: u8,
        max_records: usize,
    ) -> Result<Self, ParameterError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(ParameterError::EmptyKeywords);
        }
        if max_records == 0 {
            return Err(ParameterError::ZeroMaxRecords);
        }
        if experience_years > MAX_EXPERIENCE_YEARS {
            return Err(ParameterError::ExperienceOutOfRange(experience_years));
        }

        Ok(SearchParameters {
            keywords: keywords.to_string(),
            location: location.trim().to_string(),
            experience_years,
            max_records,
        })
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn experience_years(&self) -> u8 {
        self.experience_years
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }
}

/// Position of the pager within one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub page_number: u32,
    pub current_url: String,
}

impl PageCursor {
    pub fn first(url: String) -> Self {
        PageCursor {
            page_number: 1,
            current_url: url,
        }
    }

    pub fn advance(&mut self, url: String) {
        self.page_number += 1;
        self.current_url = url;
    }
}
