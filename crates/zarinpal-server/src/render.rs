//! Result pages for the verification callback.
//!
//! The checkout flow hands back a structured [`CallbackOutcome`]; this
//! module is the presentation side that turns each variant into a page.

use actix_web::http::StatusCode;

use zarinpal::CallbackOutcome;

/// A rendered result page plus its HTTP status.
pub struct ResultPage {
    pub status: StatusCode,
    pub html: String,
}

/// Palette per outcome kind.
enum Tone {
    Success,
    Info,
    Failure,
}

impl Tone {
    fn colors(&self) -> (&'static str, &'static str) {
        match self {
            Tone::Success => ("#d4edda", "#155724"),
            Tone::Info => ("#d1ecf1", "#0c5460"),
            Tone::Failure => ("#f8d7da", "#721c24"),
        }
    }
}

fn page(title: &str, heading: &str, body: &str, tone: Tone, sandbox: bool) -> String {
    let (background, heading_color) = tone.colors();
    let sandbox_notice = if sandbox {
        r#"<div class="sandbox-notice">حالت آزمایشی (سندباکس) - هیچ پرداخت واقعی انجام نشده است</div>"#
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html>
<html dir="rtl" lang="fa">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: 'Vazirmatn', sans-serif; text-align: center; padding: 50px; }}
.container {{ max-width: 500px; margin: 0 auto; padding: 20px; border-radius: 10px; background-color: {background}; }}
h1 {{ color: {heading_color}; }}
p {{ margin: 20px 0; }}
.ref-id {{ font-weight: bold; font-size: 18px; color: #0c5460; }}
a {{ display: inline-block; background-color: #6c5ce7; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; margin-top: 20px; }}
.sandbox-notice {{ background-color: #fff3cd; color: #856404; border: 1px solid #ffeeba; padding: 10px; border-radius: 5px; margin-bottom: 20px; }}
</style>
<link href="https://cdn.jsdelivr.net/npm/vazirmatn@33.0.0/Vazirmatn-font-face.css" rel="stylesheet">
</head>
<body>
<div class="container">
{sandbox_notice}
<h1>{heading}</h1>
{body}
<a href="/">بازگشت به صفحه اصلی</a>
</div>
</body>
</html>"#
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the page for one verification outcome.
pub fn callback_page(outcome: &CallbackOutcome, sandbox: bool) -> ResultPage {
    match outcome {
        CallbackOutcome::Completed {
            ref_id, card_pan, ..
        } => {
            let ref_id = ref_id.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
            let card_pan = card_pan.as_deref().unwrap_or("-");
            let body = format!(
                "<p>پرداخت شما با موفقیت انجام شد.</p>\n\
                 <p>کد پیگیری: <span class=\"ref-id\">{}</span></p>\n\
                 <p>شماره کارت: {}</p>",
                escape(&ref_id),
                escape(card_pan)
            );
            ResultPage {
                status: StatusCode::OK,
                html: page("پرداخت موفق", "پرداخت موفق", &body, Tone::Success, sandbox),
            }
        }
        CallbackOutcome::AlreadyProcessed => ResultPage {
            status: StatusCode::OK,
            html: page(
                "پرداخت تکراری",
                "پرداخت تکراری",
                "<p>این تراکنش قبلاً با موفقیت تایید شده است.</p>",
                Tone::Info,
                sandbox,
            ),
        },
        CallbackOutcome::Cancelled => ResultPage {
            status: StatusCode::BAD_REQUEST,
            html: page(
                "پرداخت ناموفق",
                "پرداخت ناموفق",
                "<p>تراکنش شما لغو شد یا با خطا مواجه شد.</p>",
                Tone::Failure,
                sandbox,
            ),
        },
        CallbackOutcome::UnknownTransaction => ResultPage {
            status: StatusCode::BAD_REQUEST,
            html: page(
                "خطا در تایید پرداخت",
                "خطا در تایید پرداخت",
                "<p>اطلاعات تراکنش یافت نشد. لطفا دوباره تلاش کنید.</p>",
                Tone::Failure,
                sandbox,
            ),
        },
        CallbackOutcome::Failed { message } => {
            let detail = message.as_deref().unwrap_or("خطای ناشناخته");
            let body = format!("<p>خطای تایید پرداخت: {}</p>", escape(detail));
            ResultPage {
                status: StatusCode::BAD_REQUEST,
                html: page(
                    "خطا در تایید پرداخت",
                    "خطا در تایید پرداخت",
                    &body,
                    Tone::Failure,
                    sandbox,
                ),
            }
        }
    }
}

/// Page for unexpected internal errors at the callback boundary.
pub fn internal_error_page(sandbox: bool) -> ResultPage {
    ResultPage {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        html: page(
            "خطای سرور",
            "خطای سرور",
            "<p>خطای داخلی در تایید پرداخت. لطفا با پشتیبانی تماس بگیرید.</p>",
            Tone::Failure,
            sandbox,
        ),
    }
}
