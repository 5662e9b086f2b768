use serde::{Deserialize, Serialize};

// Canonical entity shapes served to the UI. Raw backend rows are mapped
// into these by each entity module's normalization step; unknown enum
// values from the backend fall back to a default instead of failing the
// whole fetch.

macro_rules! backend_enum {
    ($name:ident, $default:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub fn parse(s: &str) -> $name {
                match s.trim() {
                    $($text => $name::$variant,)+
                    _ => $name::$default,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }
    };
}

backend_enum!(Gender, Other, {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

backend_enum!(PersonStatus, Active, {
    Active => "Active",
    Discontinued => "Discontinued",
});

backend_enum!(StaffRole, Other, {
    Trainer => "Trainer",
    Counsellor => "Counsellor",
    FrontDesk => "Front Desk",
    Sales => "Sales",
    Other => "Other",
});

backend_enum!(EmploymentType, FullTime, {
    FullTime => "Full-time",
    PartTime => "Part-time",
    Contract => "Contract",
});

backend_enum!(SalaryType, Monthly, {
    Monthly => "Monthly",
    Hourly => "Hourly",
});

backend_enum!(BatchStatus, Upcoming, {
    Upcoming => "Upcoming",
    Ongoing => "Ongoing",
    Completed => "Completed",
});

backend_enum!(Weekday, Mon, {
    Mon => "Mon",
    Tue => "Tue",
    Wed => "Wed",
    Thu => "Thu",
    Fri => "Fri",
    Sat => "Sat",
    Sun => "Sun",
});

backend_enum!(FeeStatus, Pending, {
    Paid => "Paid",
    Pending => "Pending",
});

backend_enum!(PaymentMethod, Other, {
    Cash => "Cash",
    Card => "Card",
    Online => "Online",
    Other => "Other",
});

backend_enum!(ExpenseCategory, Other, {
    Salary => "Salary",
    Utilities => "Utilities",
    Marketing => "Marketing",
    Rent => "Rent",
    Other => "Other",
});

backend_enum!(AssignmentStatus, Pending, {
    Pending => "Pending",
    Submitted => "Submitted",
});

backend_enum!(LeadSource, Other, {
    WalkIn => "Walk-in",
    Website => "Website",
    Referral => "Referral",
    SocialMedia => "Social Media",
    Other => "Other",
});

backend_enum!(LeadStatus, New, {
    New => "New",
    Contacted => "Contacted",
    FollowUp => "Follow-up",
    Converted => "Converted",
    Lost => "Lost",
});

backend_enum!(PersonType, Student, {
    Student => "student",
    Staff => "staff",
});

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course_ids: Vec<String>,
    pub course_names: Vec<String>,
    pub batch_ids: Vec<String>,
    pub batch_names: Vec<String>,
    pub status: PersonStatus,
    pub gender: Gender,
    pub admission_date: String,
    pub address: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub code: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub gender: Gender,
    pub role: StaffRole,
    // Course ids; meaningful only for trainers.
    pub expertise: Vec<String>,
    pub expertise_names: Vec<String>,
    pub employment_type: EmploymentType,
    pub salary: f64,
    pub salary_type: SalaryType,
    pub status: PersonStatus,
    pub joining_date: String,
    pub about: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub category: String,
    pub level: String,
    pub duration: String,
    pub total_fee: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub name: String,
    pub course_id: String,
    pub course_name: String,
    pub staff_id: String,
    pub staff_name: String,
    pub weekdays: Vec<Weekday>,
    pub time: String,
    pub start_date: String,
    pub status: BatchStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayment {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub amount: f64,
    pub date: String,
    pub status: FeeStatus,
    pub payment_method: PaymentMethod,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub date: String,
    pub staff_id: Option<String>,
    pub staff_name: Option<String>,
    pub bill_url: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub course_id: String,
    pub course_name: String,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub staff_name: String,
    pub due_date: String,
    pub status: AssignmentStatus,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadComment {
    pub text: String,
    #[serde(default)]
    pub author_staff_id: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub interested_course_id: String,
    pub interested_course_name: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub enquiry_date: String,
    pub next_follow_up_date: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_name: Option<String>,
    pub comments: Vec<LeadComment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub date: String,
    pub person_type: PersonType,
    pub person_id: String,
    pub person_name: String,
    pub hours_present: f64,
}
