//! Texts of the notifications the back office sends on its own.

use rust_decimal::Decimal;

use crate::models::{Localized, Message};

fn taka(amount: Decimal) -> String {
    format!("৳{}", amount.normalize())
}

pub fn order_completed(item: &str) -> Localized {
    Localized {
        en: Message::new(
            "Order Successful!",
            format!("Your order for '{item}' completed successfully."),
        ),
        bn: Message::new(
            "অর্ডার সফল!",
            format!("আপনার '{item}' অর্ডারটি সফলভাবে সম্পন্ন হয়েছে।"),
        ),
    }
}

pub fn order_rejected(item: &str) -> Localized {
    Localized {
        en: Message::new(
            "Order Cancelled",
            format!("Your order for '{item}' cancelled. Reason: Information not correct."),
        ),
        bn: Message::new(
            "অর্ডার বাতিল",
            format!("আপনার '{item}' অর্ডারটি বাতিল হয়েছে। কারণ: তথ্য সঠিক নয়।"),
        ),
    }
}

pub fn order_auto_refunded(order_id: &str, price: Decimal, minutes: u32) -> Localized {
    let price = taka(price);
    Localized {
        en: Message::new(
            "Order Auto-Refunded",
            format!(
                "Order ID: {order_id} for {price} was not processed within {minutes} mins and has been auto-refunded and deleted."
            ),
        ),
        bn: Message::new(
            "অর্ডার অটো-রিফান্ড",
            format!(
                "অর্ডার আইডি: {order_id} ({price}) নির্দিষ্ট সময়ে সম্পন্ন না হওয়ায় এটি মুছে ফেলা হয়েছে এবং টাকা রিফান্ড করা হয়েছে।"
            ),
        ),
    }
}

pub fn deposit_approved(amount: Decimal) -> Localized {
    let amount = taka(amount);
    Localized {
        en: Message::new(
            "Funds Added!",
            format!("{amount} added to your account. Thank you."),
        ),
        bn: Message::new(
            "টাকা যোগ হয়েছে!",
            format!("আপনার অ্যাকাউন্টে {amount} যোগ করা হয়েছে। ধন্যবাদ।"),
        ),
    }
}

pub fn deposit_rejected(amount: Decimal) -> Localized {
    let amount = taka(amount);
    Localized {
        en: Message::new(
            "Deposit Rejected",
            format!("Deposit request for {amount} rejected. Reason: Transaction ID not valid."),
        ),
        bn: Message::new(
            "ডিপোজিট বাতিল",
            format!("আপনার {amount} জমার অনুরোধটি বাতিল হয়েছে। কারণ: ট্রানজেকশন আইডি সঠিক নয়।"),
        ),
    }
}

pub fn balance_updated(amount: Decimal, credited: bool) -> Localized {
    let amount = taka(amount);
    let (en_verb, bn_verb) = if credited {
        ("added to", "যোগ")
    } else {
        ("deducted from", "কর্তন")
    };
    Localized {
        en: Message::new(
            "Balance Update",
            format!("{amount} {en_verb} your balance."),
        ),
        bn: Message::new(
            "ব্যালেন্স আপডেট",
            format!("আপনার অ্যাকাউন্টে {amount} {bn_verb} করা হয়েছে।"),
        ),
    }
}
