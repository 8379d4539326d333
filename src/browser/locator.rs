use std::borrow::Cow;
use std::fmt;
use thirtyfour::By;

/// Element selector understood by every `PortalPage` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(Cow<'static, str>),
    Css(Cow<'static, str>),
    LinkText(Cow<'static, str>),
    XPath(Cow<'static, str>),
}

impl Locator {
    pub const fn id(s: &'static str) -> Self {
        Locator::Id(Cow::Borrowed(s))
    }

    pub const fn css(s: &'static str) -> Self {
        Locator::Css(Cow::Borrowed(s))
    }

    pub const fn link_text(s: &'static str) -> Self {
        Locator::LinkText(Cow::Borrowed(s))
    }

    pub const fn xpath(s: &'static str) -> Self {
        Locator::XPath(Cow::Borrowed(s))
    }

    pub fn css_owned(s: String) -> Self {
        Locator::Css(Cow::Owned(s))
    }

    pub fn xpath_owned(s: String) -> Self {
        Locator::XPath(Cow::Owned(s))
    }

    pub fn to_by(&self) -> By {
        match self {
            Locator::Id(s) => By::Id(s.as_ref()),
            Locator::Css(s) => By::Css(s.as_ref()),
            Locator::LinkText(s) => By::LinkText(s.as_ref()),
            Locator::XPath(s) => By::XPath(s.as_ref()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(s) => write!(f, "#{}", s),
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::LinkText(s) => write!(f, "link:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}
