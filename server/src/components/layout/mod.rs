use maud::{html, Markup, Render};

pub struct Page {
    pub title: String,
    pub content: Box<dyn Render>,
}

impl Page {
    pub fn new(title: String, content: Box<dyn Render>) -> Self {
        Self { title, content }
    }
}

impl Render for Page {
    fn render(&self) -> Markup {
        html! {
            head {
                title { (self.title) }
                script src="https://unpkg.com/@tailwindcss/browser@4" {}
                link rel="stylesheet" href=(crate::static_assets::asset_url("site.css"));
                link rel="icon" href=(crate::static_assets::asset_url("favicon.svg"));
                meta name="viewport" content="width=device-width, initial-scale=1.0";
            }

            div class="min-h-screen bg-stone-50 text-stone-800" {
                header class="max-w-3xl mx-auto px-4 pt-6 pb-4 flex items-baseline justify-between" {
                    a href="/" class="text-lg font-semibold text-amber-700 hover:text-amber-900" { "porchlight" }

                    nav class="flex gap-4 text-sm" {
                        a href="/projects" class="hover:text-amber-700" { "Projects" }
                        a href="/articles" class="hover:text-amber-700" { "Articles" }
                        a href="/guestbook" class="hover:text-amber-700" { "Guestbook" }
                    }
                }

                main class="max-w-3xl mx-auto px-4 pb-12" {
                    (self.content.render())
                }

                footer class="max-w-3xl mx-auto px-4 py-6 border-t border-stone-200 text-sm text-stone-500" {
                    p { "© 2024 porchlight.dev — leave a note in the guestbook on your way out" }
                }
            }
        }
    }
}

impl axum::response::IntoResponse for Page {
    fn into_response(self) -> axum::response::Response {
        self.render().into_response()
    }
}

pub struct Card {
    pub content: Box<dyn Render>,
}

impl Card {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            content: Box::new(content),
        }
    }
}

impl Render for Card {
    fn render(&self) -> Markup {
        html! {
            div class="bg-white rounded-lg border border-stone-200 shadow-sm p-5 mb-4" {
                (self.content.render())
            }
        }
    }
}

pub struct ContentSection {
    pub content: Box<dyn Render>,
}

impl ContentSection {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            content: Box::new(content),
        }
    }
}

impl Render for ContentSection {
    fn render(&self) -> Markup {
        html! {
            section class="mt-8" {
                (self.content.render())
            }
        }
    }
}
