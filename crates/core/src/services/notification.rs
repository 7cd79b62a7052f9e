//! Applicant and admin notifications.
//!
//! Every notice goes out over each configured channel on its own task. A
//! failed delivery is logged and never reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;
use mwb_common::{
    AppResult,
    config::{PaymentConfig, WhatsAppConfig},
};
use mwb_db::entities::registration;

use super::email::{EmailMessage, EmailService, wrap_html};
use super::whatsapp::WhatsAppService;

/// Who a notice is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Sent to the applicant right after registering, with payment instructions.
    RegistrationReceived,
    /// Copy of a new registration for the organisers.
    AdminNewRegistration,
    PaymentVerified,
    PaymentRejected,
}

/// Rendered-independent notice content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub full_name: String,
    pub registration_number: String,
    pub category: String,
    pub province: String,
    pub invoice_id: String,
    pub participant_number: String,
    pub invoice_amount: i64,
    pub bank_name: String,
    pub bank_account_number: String,
    pub bank_account_holder: String,
    pub admin_whatsapp: String,
}

impl Notice {
    /// Build a notice about `registration`.
    #[must_use]
    pub fn for_registration(
        kind: NoticeKind,
        registration: &registration::Model,
        payment: &PaymentConfig,
        admin_whatsapp: &str,
    ) -> Self {
        Self {
            kind,
            full_name: registration.full_name.clone(),
            registration_number: registration.registration_number.clone(),
            category: registration.category.name().to_string(),
            province: registration.province.clone(),
            invoice_id: registration.invoice_id.clone(),
            participant_number: registration.participant_number.clone(),
            invoice_amount: registration.invoice_amount,
            bank_name: payment.bank_name.clone(),
            bank_account_number: payment.bank_account_number.clone(),
            bank_account_holder: payment.bank_account_holder.clone(),
            admin_whatsapp: admin_whatsapp.to_string(),
        }
    }

    /// Subject line, also used as the WhatsApp heading.
    #[must_use]
    pub fn subject(&self) -> String {
        match self.kind {
            NoticeKind::RegistrationReceived => {
                format!("Pendaftaran Audisi {} Diterima - {}", self.category, self.invoice_id)
            }
            NoticeKind::AdminNewRegistration => {
                format!("Pendaftar Baru: {} ({})", self.full_name, self.invoice_id)
            }
            NoticeKind::PaymentVerified => {
                format!("Pembayaran Terverifikasi - {}", self.participant_number)
            }
            NoticeKind::PaymentRejected => {
                format!("Pembayaran Ditolak - {}", self.invoice_id)
            }
        }
    }

    /// Plain-text body shared by email and WhatsApp.
    #[must_use]
    pub fn text_body(&self) -> String {
        let amount = format_rupiah(self.invoice_amount);
        match self.kind {
            NoticeKind::RegistrationReceived => format!(
                "Halo {name},\n\n\
                 Pendaftaran Anda untuk audisi *{category}* Movement With Benefit telah kami terima.\n\n\
                 Nomor Registrasi: {reg}\n\
                 Invoice ID: {invoice}\n\
                 Nomor Peserta: {participant}\n\n\
                 Silakan transfer tepat sebesar *{amount}* ke rekening {bank} {account} a.n. {holder}, \
                 lalu unggah bukti transfer melalui halaman status pendaftaran.\n\
                 Nominal yang unik memudahkan kami mencocokkan pembayaran Anda.\n\n\
                 Pertanyaan? Hubungi admin di WhatsApp {admin}.",
                name = self.full_name,
                category = self.category,
                reg = self.registration_number,
                invoice = self.invoice_id,
                participant = self.participant_number,
                bank = self.bank_name,
                account = self.bank_account_number,
                holder = self.bank_account_holder,
                admin = self.admin_whatsapp,
            ),
            NoticeKind::AdminNewRegistration => format!(
                "Pendaftar baru masuk.\n\n\
                 Nama: {name}\n\
                 Kategori: {category}\n\
                 Provinsi: {province}\n\
                 Nomor Registrasi: {reg}\n\
                 Invoice ID: {invoice}\n\
                 Nominal: {amount}",
                name = self.full_name,
                category = self.category,
                province = self.province,
                reg = self.registration_number,
                invoice = self.invoice_id,
            ),
            NoticeKind::PaymentVerified => format!(
                "Selamat {name}!\n\n\
                 Pembayaran Anda telah diverifikasi dan Anda resmi terdaftar sebagai peserta audisi \
                 *{category}* Movement With Benefit.\n\n\
                 Nomor Peserta: {participant}\n\
                 Invoice ID: {invoice}\n\n\
                 Simpan nomor peserta ini sebagai nomor registrasi ulang ketika babak penyisihan.\n\n\
                 Hubungi kami: WhatsApp {admin}",
                name = self.full_name,
                category = self.category,
                participant = self.participant_number,
                invoice = self.invoice_id,
                admin = self.admin_whatsapp,
            ),
            NoticeKind::PaymentRejected => format!(
                "Halo {name},\n\n\
                 Mohon maaf, bukti pembayaran untuk invoice {invoice} tidak dapat kami verifikasi.\n\
                 Pastikan Anda mentransfer tepat sebesar {amount}, lalu hubungi admin di WhatsApp {admin} \
                 dengan menyertakan nomor registrasi {reg}.",
                name = self.full_name,
                invoice = self.invoice_id,
                reg = self.registration_number,
                admin = self.admin_whatsapp,
            ),
        }
    }

    /// HTML body for email.
    #[must_use]
    pub fn html_body(&self) -> String {
        let paragraphs: String = self
            .text_body()
            .split("\n\n")
            .map(|block| format!("<p>{}</p>", escape_html(block).replace('\n', "<br>")))
            .collect();
        wrap_html(&paragraphs)
    }
}

/// Format an amount as Indonesian rupiah, e.g. `Rp 250.010.111`.
#[must_use]
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A delivery channel for notices.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &'static str;

    /// Deliver `notice` to `recipient`. Recipients without an address on this
    /// channel are skipped.
    async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> AppResult<()>;
}

#[async_trait]
impl NotificationChannel for EmailService {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> AppResult<()> {
        let Some(to) = &recipient.email else {
            return Ok(());
        };

        self.send(EmailMessage {
            to: to.clone(),
            subject: notice.subject(),
            text_body: notice.text_body(),
            html_body: Some(notice.html_body()),
        })
        .await
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppService {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> AppResult<()> {
        let Some(number) = &recipient.whatsapp else {
            return Ok(());
        };

        let message = format!("*{}*\n\n{}", notice.subject(), notice.text_body());
        self.send(number, &message).await
    }
}

/// Fans notices out to every channel.
#[derive(Clone)]
pub struct NotificationService {
    channels: Vec<Arc<dyn NotificationChannel>>,
    payment: PaymentConfig,
    admin: Recipient,
}

impl NotificationService {
    /// Create a notification service over `channels`.
    #[must_use]
    pub fn new(
        channels: Vec<Arc<dyn NotificationChannel>>,
        payment: PaymentConfig,
        admin_email: &str,
        whatsapp: &WhatsAppConfig,
    ) -> Self {
        Self {
            channels,
            payment,
            admin: Recipient {
                name: "Admin".to_string(),
                email: Some(admin_email.to_string()),
                whatsapp: Some(whatsapp.admin_number.clone()),
            },
        }
    }

    /// A service with no channels.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(
            Vec::new(),
            PaymentConfig::default(),
            "",
            &WhatsAppConfig::default(),
        )
    }

    fn applicant(registration: &registration::Model) -> Recipient {
        Recipient {
            name: registration.full_name.clone(),
            email: Some(registration.email.clone()),
            whatsapp: Some(registration.whatsapp_number.clone()),
        }
    }

    fn notice(&self, kind: NoticeKind, registration: &registration::Model) -> Notice {
        let admin_whatsapp = self.admin.whatsapp.as_deref().unwrap_or_default();
        Notice::for_registration(kind, registration, &self.payment, admin_whatsapp)
    }

    /// Confirm a new registration to the applicant and copy the organisers.
    pub fn registration_received(&self, registration: &registration::Model) {
        self.dispatch(
            Self::applicant(registration),
            self.notice(NoticeKind::RegistrationReceived, registration),
        );
        self.dispatch(
            self.admin.clone(),
            self.notice(NoticeKind::AdminNewRegistration, registration),
        );
    }

    /// Tell the applicant the outcome of payment review.
    pub fn payment_reviewed(&self, registration: &registration::Model, approved: bool) {
        let kind = if approved {
            NoticeKind::PaymentVerified
        } else {
            NoticeKind::PaymentRejected
        };
        self.dispatch(Self::applicant(registration), self.notice(kind, registration));
    }

    /// Deliver `notice` over every channel in the background.
    pub fn dispatch(&self, recipient: Recipient, notice: Notice) {
        let recipient = Arc::new(recipient);
        let notice = Arc::new(notice);

        for channel in &self.channels {
            let channel = channel.clone();
            let recipient = recipient.clone();
            let notice = notice.clone();

            tokio::spawn(async move {
                if let Err(e) = channel.deliver(&recipient, &notice).await {
                    tracing::warn!(
                        channel = channel.name(),
                        recipient = %recipient.name,
                        kind = ?notice.kind,
                        error = %e,
                        "Failed to deliver notification"
                    );
                }
            });
        }
    }
}
