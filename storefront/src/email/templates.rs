//! Order email bodies (plain text + HTML)

use shared::models::OrderDetail;
use shared::util::format_money;

use super::EmailMessage;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn created_at(detail: &OrderDetail) -> String {
    chrono::DateTime::from_timestamp_millis(detail.order.created_at)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}

fn totals_text(detail: &OrderDetail) -> String {
    let o = &detail.order;
    format!(
        "Subtotal: {}\nShipping: {}\nTotal: {}",
        format_money(o.subtotal_cents, &o.currency),
        format_money(o.shipping_cents, &o.currency),
        format_money(o.total_cents, &o.currency),
    )
}

fn items_text(detail: &OrderDetail) -> String {
    detail
        .items
        .iter()
        .map(|i| {
            format!(
                "- {} x{}  {}",
                i.name,
                i.quantity,
                format_money(i.line_total_cents(), &detail.order.currency)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Customer confirmation for a paid order
pub fn order_confirmation(detail: &OrderDetail, to: &str) -> EmailMessage {
    let o = &detail.order;
    let greeting = o
        .name
        .as_deref()
        .map(|n| format!("Hi {n}, thank"))
        .unwrap_or_else(|| "Thank".to_string());

    let text = format!(
        "{greeting} you for your purchase.\n\n\
         Order ID: {}\nDate: {}\n\n{}\n\n{}\n\n\
         This is an automated email.",
        o.id,
        created_at(detail),
        items_text(detail),
        totals_text(detail),
    );

    let rows: String = detail
        .items
        .iter()
        .map(|i| {
            format!(
                "<tr><td style=\"padding:12px 0\"><strong>{}</strong><br/>\
                 <span style=\"color:#888;font-size:12px\">Qty: {}</span></td>\
                 <td style=\"text-align:right\">{}</td></tr>",
                escape(&i.name),
                i.quantity,
                escape(&format_money(i.line_total_cents(), &o.currency)),
            )
        })
        .collect();

    let html = format!(
        "<div style=\"font-family:Arial,sans-serif;max-width:600px;margin:0 auto\">\
         <h1>Order confirmed</h1>\
         <p>{} you for your purchase.</p>\
         <p>Order ID: <strong>{}</strong><br/>Date: {}</p>\
         <table width=\"100%\">{rows}</table>\
         <p>Subtotal: {}<br/>Shipping: {}<br/><strong>Total: {}</strong></p>\
         <p style=\"color:#666;font-size:12px\">This is an automated email.</p>\
         </div>",
        escape(&greeting),
        escape(&o.id),
        created_at(detail),
        escape(&format_money(o.subtotal_cents, &o.currency)),
        escape(&format_money(o.shipping_cents, &o.currency)),
        escape(&format_money(o.total_cents, &o.currency)),
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Order confirmed".to_string(),
        text,
        html: Some(html),
    }
}

/// Operator notice for a newly paid order
pub fn operator_notice(detail: &OrderDetail, to: &str) -> EmailMessage {
    let o = &detail.order;
    let address = [
        o.address_line1.as_deref(),
        o.address_line2.as_deref(),
        o.city.as_deref(),
        o.region.as_deref(),
        o.postal_code.as_deref(),
        o.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");

    let text = format!(
        "New paid order {}\n\n\
         Customer: {} <{}>\nPhone: {}\nShip to: {}\n\n{}\n\n{}",
        o.id,
        o.name.as_deref().unwrap_or("-"),
        o.email.as_deref().unwrap_or("-"),
        o.phone.as_deref().unwrap_or("-"),
        if address.is_empty() { "-" } else { &address },
        items_text(detail),
        totals_text(detail),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!(
            "New order: {}",
            format_money(o.total_cents, &o.currency)
        ),
        text,
        html: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{FulfillmentStatus, Order, OrderItem, PaymentStatus, Size};

    fn detail() -> OrderDetail {
        OrderDetail {
            order: Order {
                id: "ord_1".into(),
                stripe_session_id: "cs_1".into(),
                stripe_payment_id: None,
                last_stripe_event_id: None,
                payment_status: PaymentStatus::Paid,
                fulfillment_status: FulfillmentStatus::Unfulfilled,
                email: Some("buyer@example.com".into()),
                name: Some("Ada <Admin>".into()),
                phone: None,
                address_line1: Some("Gedimino pr. 1".into()),
                address_line2: None,
                city: Some("Vilnius".into()),
                region: None,
                postal_code: Some("01103".into()),
                country: Some("LT".into()),
                currency: "EUR".into(),
                subtotal_cents: 10_000,
                shipping_cents: 500,
                total_cents: 10_500,
                shipping_carrier: None,
                tracking_number: None,
                shipped_at: None,
                confirmation_email_sent_at: None,
                stock_applied_at: None,
                created_at: 1_767_225_600_000,
            },
            items: vec![OrderItem {
                id: "i1".into(),
                order_id: "ord_1".into(),
                product_id: "p1".into(),
                name: "Tee (M)".into(),
                price_cents: 5000,
                quantity: 2,
                size: Some(Size::M),
            }],
        }
    }

    #[test]
    fn test_confirmation_lists_items_and_totals() {
        let msg = order_confirmation(&detail(), "buyer@example.com");
        assert_eq!(msg.to, "buyer@example.com");
        assert!(msg.text.contains("Tee (M) x2  100.00 €"));
        assert!(msg.text.contains("Total: 105.00 €"));
        assert!(msg.text.contains("2026-01-01"));
    }

    #[test]
    fn test_confirmation_html_escapes_customer_input() {
        let html = order_confirmation(&detail(), "x@example.com").html.unwrap();
        assert!(html.contains("Ada &lt;Admin&gt;"));
        assert!(!html.contains("<Admin>"));
    }

    #[test]
    fn test_operator_notice_has_address() {
        let msg = operator_notice(&detail(), "ops@example.com");
        assert!(msg.subject.contains("105.00 €"));
        assert!(msg.text.contains("Gedimino pr. 1, Vilnius, 01103, LT"));
        assert!(msg.html.is_none());
    }
}
