use maud::{html, Markup, Render};

/// A small tag pill, optionally linking to the filtered listing for that tag
pub struct TagBadge {
    pub tag: String,
    pub href: Option<String>,
    pub active: bool,
}

impl TagBadge {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            href: None,
            active: false,
        }
    }

    pub fn linking_to(mut self, href: String) -> Self {
        self.href = Some(href);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

impl Render for TagBadge {
    fn render(&self) -> Markup {
        let classes = if self.active {
            "inline-block px-2 py-0.5 text-xs rounded-full bg-amber-600 text-white"
        } else {
            "inline-block px-2 py-0.5 text-xs rounded-full bg-stone-100 text-stone-600 hover:bg-amber-100"
        };

        match &self.href {
            Some(href) => html! {
                a href=(href) class=(classes) { (self.tag) }
            },
            None => html! {
                span class=(classes) { (self.tag) }
            },
        }
    }
}
