use std::fmt;

/// Where to look for an element, in the driver's query languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Css(String),
    ClassName(String),
}

impl Locator {
    pub fn xpath(expr: &str) -> Self {
        Locator::XPath(expr.to_string())
    }

    pub fn css(expr: &str) -> Self {
        Locator::Css(expr.to_string())
    }

    pub fn class_name(name: &str) -> Self {
        Locator::ClassName(name.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(expr) => write!(f, "xpath:{}", expr),
            Locator::Css(expr) => write!(f, "css:{}", expr),
            Locator::ClassName(name) => write!(f, "class:{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Company,
    Location,
    Experience,
    Rating,
    Skills,
    PostedDate,
    DetailLink,
    ExternalId,
    Description,
}

impl Field {
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Field::Skills)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// The listing element itself.
    Container,
    Descendant(Locator),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Read {
    Text,
    Attr(&'static str),
    /// Live DOM property, so `href` comes back as an absolute URL.
    Prop(&'static str),
    /// Like `Prop`, but nothing when the element's own text is blank. Pairs a
    /// link with the anchor a text strategy over the same locators would pick.
    PropOfTitled(&'static str),
    /// Attribute when present and non-blank, otherwise the visible text.
    AttrOrText(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accept {
    NonEmpty,
    LongerThan(usize),
    /// Case-insensitive substring match against any needle.
    ContainsAny(&'static [&'static str]),
}

impl Accept {
    pub fn admits(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Accept::NonEmpty => true,
            Accept::LongerThan(n) => value.chars().count() > *n,
            Accept::ContainsAny(needles) => {
                let value = value.to_lowercase();
                needles.iter().any(|n| value.contains(&n.to_lowercase()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: &'static str,
    pub target: Target,
    pub read: Read,
    pub accept: Accept,
}

impl Strategy {
    pub fn text(name: &'static str, xpath: &str) -> Self {
        Strategy {
            name,
            target: Target::Descendant(Locator::xpath(xpath)),
            read: Read::Text,
            accept: Accept::NonEmpty,
        }
    }

    pub fn attr(name: &'static str, xpath: &str, attr: &'static str) -> Self {
        Strategy {
            name,
            target: Target::Descendant(Locator::xpath(xpath)),
            read: Read::Attr(attr),
            accept: Accept::NonEmpty,
        }
    }

    pub fn reading(mut self, read: Read) -> Self {
        self.read = read;
        self
    }

    pub fn accepting(mut self, accept: Accept) -> Self {
        self.accept = accept;
        self
    }
}

/// Ordered strategies for one logical field, most specific first.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    pub strategies: Vec<Strategy>,
}

/// Every locator the scraper knows about for one site.
#[derive(Debug, Clone)]
pub struct SelectorCatalog {
    pub containers: Vec<Locator>,
    pub fields: Vec<FieldSpec>,
    pub next_page: Vec<Locator>,
    pub login: LoginLocators,
    pub search_form: SearchFormLocators,
}

#[derive(Debug, Clone)]
pub struct LoginLocators {
    pub username: Locator,
    pub password: Locator,
    pub submit: Vec<Locator>,
    pub errors: Vec<Locator>,
}

#[derive(Debug, Clone)]
pub struct SearchFormLocators {
    pub search_bar: Vec<Locator>,
    /// Searched inside the search bar.
    pub expander: Locator,
    pub keywords: Locator,
    pub experience_dropdown: Locator,
    pub location: Locator,
    pub submit: Locator,
}

impl SearchFormLocators {
    pub fn experience_option(&self, years: u8) -> Locator {
        Locator::XPath(format!(
            "//li[@value='a{}' and @title='{} years']",
            years, years
        ))
    }
}

impl SelectorCatalog {
    pub fn field(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.field == field)
    }

    /// Selectors for naukri.com search result pages.
    pub fn naukri() -> Self {
        let title_anchors = [
            ("h2-title-anchor", ".//h2/a[@class='title']"),
            ("h2-title-class", ".//h2/a[contains(@class, 'title')]"),
            ("any-title-anchor", ".//a[contains(@class, 'title')]"),
            ("h2-anchor", ".//h2//a"),
            ("job-listing-href", ".//a[contains(@href, 'job-listings')]"),
        ];

        let fields = vec![
            FieldSpec {
                field: Field::Title,
                strategies: title_anchors
                    .iter()
                    .map(|&(name, xpath)| Strategy::text(name, xpath))
                    .collect(),
            },
            FieldSpec {
                field: Field::DetailLink,
                strategies: title_anchors
                    .iter()
                    .map(|&(name, xpath)| {
                        Strategy::text(name, xpath).reading(Read::PropOfTitled("href"))
                    })
                    .collect(),
            },
            FieldSpec {
                field: Field::Company,
                strategies: vec![
                    Strategy::text("comp-name-exact", ".//a[@class='comp-name mw-25']"),
                    Strategy::text("comp-name-anchor", ".//a[contains(@class, 'comp-name')]"),
                    Strategy::text("comp-name-span", ".//span[contains(@class, 'comp-name')]"),
                    Strategy::text("company-href", ".//a[contains(@href, 'company')]"),
                ],
            },
            FieldSpec {
                field: Field::Rating,
                strategies: vec![
                    Strategy::text("main-2", ".//span[@class='main-2']"),
                    Strategy::text("rating-anchor", ".//a[contains(@class, 'rating')]//span"),
                ],
            },
            FieldSpec {
                field: Field::Experience,
                strategies: [
                    ("expwdth", ".//span[@class='expwdth']"),
                    ("exp-class", ".//span[contains(@class, 'exp')]"),
                    ("yrs-title", ".//span[contains(@title, 'Yrs')]"),
                    ("yrs-text", ".//span[contains(text(), 'Yrs')]"),
                ]
                .iter()
                .map(|&(name, xpath)| {
                    Strategy::text(name, xpath)
                        .reading(Read::AttrOrText("title"))
                        .accepting(Accept::ContainsAny(&["yr", "exp"]))
                })
                .collect(),
            },
            FieldSpec {
                field: Field::Location,
                strategies: [
                    ("locwdth", ".//span[@class='locWdth']"),
                    ("loc-class", ".//span[contains(@class, 'loc')]"),
                    ("comma-title", ".//span[contains(@title, ',')]"),
                ]
                .iter()
                .map(|&(name, xpath)| {
                    Strategy::text(name, xpath)
                        .reading(Read::AttrOrText("title"))
                        .accepting(Accept::LongerThan(2))
                })
                .collect(),
            },
            FieldSpec {
                field: Field::Description,
                strategies: vec![
                    Strategy::text(
                        "job-desc-exact",
                        ".//span[@class='job-desc ni-job-tuple-icon ni-job-tuple-icon-srp-description']",
                    ),
                    Strategy::text("job-desc-span", ".//span[contains(@class, 'job-desc')]"),
                    Strategy::text("description-div", ".//div[contains(@class, 'description')]"),
                    Strategy::text("description-span", ".//span[contains(@class, 'description')]"),
                ],
            },
            FieldSpec {
                field: Field::Skills,
                strategies: vec![
                    Strategy::text("tag-li", ".//li[@class='dot-gt tag-li ']"),
                    Strategy::text("tags-list", ".//ul[contains(@class, 'tags')]/li"),
                ],
            },
            FieldSpec {
                field: Field::PostedDate,
                strategies: vec![
                    Strategy::text("job-post-day-exact", ".//span[@class='job-post-day ']"),
                    Strategy::text("job-post-day", ".//span[contains(@class, 'job-post-day')]"),
                    Strategy::text("days-ago", ".//span[contains(text(), 'days ago')]"),
                    Strategy::text("day-ago", ".//span[contains(text(), 'day ago')]"),
                ],
            },
            FieldSpec {
                field: Field::ExternalId,
                strategies: vec![
                    Strategy {
                        name: "container-data-job-id",
                        target: Target::Container,
                        read: Read::Attr("data-job-id"),
                        accept: Accept::NonEmpty,
                    },
                    Strategy::attr("nested-data-job-id", ".//*[@data-job-id]", "data-job-id"),
                ],
            },
        ];

        SelectorCatalog {
            containers: vec![
                Locator::class_name("srp-jobtuple-wrapper"),
                Locator::xpath("//article[contains(@class, 'jobTuple')]"),
                Locator::css("div[data-job-id]"),
            ],
            fields,
            next_page: vec![
                Locator::xpath(
                    "//a[contains(@class, 'styles_btn-secondary__2AsIP') and contains(., 'Next')]",
                ),
                Locator::xpath(
                    "//a[contains(@href, '-2') and contains(@class, 'styles_btn-secondary__2AsIP')]",
                ),
                Locator::xpath("//a[contains(., 'Next')]"),
                Locator::xpath("//a[contains(@class, 'next')]"),
            ],
            login: LoginLocators {
                username: Locator::xpath("//input[@id='usernameField']"),
                password: Locator::xpath("//input[@id='passwordField']"),
                submit: vec![
                    Locator::xpath("//button[@type='submit' and contains(text(), 'Login')]"),
                    Locator::xpath("//button[@type='submit']"),
                ],
                errors: vec![
                    Locator::class_name("err-msg"),
                    Locator::class_name("error-message"),
                    Locator::class_name("alert-danger"),
                    Locator::xpath("//div[contains(@class, 'error')]"),
                    Locator::xpath("//span[contains(@class, 'error')]"),
                ],
            },
            search_form: SearchFormLocators {
                search_bar: vec![
                    Locator::class_name("nI-gNb-search-bar"),
                    Locator::xpath("//div[contains(@class, 'search-bar')]"),
                ],
                expander: Locator::class_name("nI-gNb-sb__main"),
                keywords: Locator::xpath(
                    ".//input[@placeholder='Enter keyword / designation / companies']",
                ),
                experience_dropdown: Locator::xpath(
                    ".//span[@class='ni-gnb-icn ni-gnb-icn-expand-more']",
                ),
                location: Locator::xpath(".//input[@placeholder='Enter location']"),
                submit: Locator::xpath(".//button[@class='nI-gNb-sb__icon-wrapper']"),
            },
        }
    }
}
