//! Read-only traversal of statements and expressions.
//!
//! Children are visited in a fixed order: the order of the fields in each
//! variant. Anonymous class bodies (`Expr::New { body: Some(..) }`) are not
//! entered; their members belong to a different type unit. Lambda bodies are
//! entered, they run in the member that contains them. Every pass that
//! numbers anonymous classes relies on this order.

use crate::expr::{Expr, LambdaBody};
use crate::stmt::{Block, Stmt};

pub trait Visitor {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block(block) => visitor.visit_block(block),
        Stmt::LocalVar { init, .. } => {
            if let Some(init) = init {
                visitor.visit_expr(init);
            }
        }
        Stmt::Expr { expr } | Stmt::Throw { value: expr } => visitor.visit_expr(expr),
        Stmt::Return { value } => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Stmt::If { cond, then, els } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(then);
            if let Some(els) = els {
                visitor.visit_stmt(els);
            }
        }
        Stmt::While { cond, body } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(body);
        }
        Stmt::DoWhile { body, cond } => {
            visitor.visit_stmt(body);
            visitor.visit_expr(cond);
        }
        Stmt::For {
            init,
            cond,
            update,
            body,
        } => {
            for stmt in init {
                visitor.visit_stmt(stmt);
            }
            if let Some(cond) = cond {
                visitor.visit_expr(cond);
            }
            for expr in update {
                visitor.visit_expr(expr);
            }
            visitor.visit_stmt(body);
        }
        Stmt::ForEach { iterable, body, .. } => {
            visitor.visit_expr(iterable);
            visitor.visit_stmt(body);
        }
        Stmt::Try {
            body,
            catches,
            finally,
        } => {
            visitor.visit_block(body);
            for clause in catches {
                visitor.visit_block(&clause.body);
            }
            if let Some(finally) = finally {
                visitor.visit_block(finally);
            }
        }
        Stmt::ExplicitCtorCall { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Stmt::Synchronized { lock, body, .. } => {
            visitor.visit_expr(lock);
            visitor.visit_block(body);
        }
        Stmt::Switch {
            selector, cases, ..
        } => {
            visitor.visit_expr(selector);
            for case in cases {
                if let Some(label) = &case.label {
                    visitor.visit_expr(label);
                }
                for stmt in &case.body {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::Labeled { body, .. } => visitor.visit_stmt(body),
        Stmt::Assert { check, message, .. } => {
            visitor.visit_expr(check);
            if let Some(message) = message {
                visitor.visit_expr(message);
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::FieldAccess { target, .. } => visitor.visit_expr(target),
        Expr::MethodCall { target, args, .. } => {
            if let Some(target) = target {
                visitor.visit_expr(target);
            }
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Expr::New { args, outer, .. } => {
            if let Some(outer) = outer {
                visitor.visit_expr(outer);
            }
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Expr::NewUnit {
            args,
            outer,
            captures,
            ..
        } => {
            if let Some(outer) = outer {
                visitor.visit_expr(outer);
            }
            for arg in args {
                visitor.visit_expr(arg);
            }
            for capture in captures {
                visitor.visit_expr(&capture.value);
            }
        }
        Expr::Assign { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Unary { operand, .. } => visitor.visit_expr(operand),
        Expr::Conditional { cond, then, els } => {
            visitor.visit_expr(cond);
            visitor.visit_expr(then);
            visitor.visit_expr(els);
        }
        Expr::Cast { expr, .. } | Expr::InstanceOf { expr, .. } => visitor.visit_expr(expr),
        Expr::ArrayAccess { array, index } => {
            visitor.visit_expr(array);
            visitor.visit_expr(index);
        }
        Expr::ArrayNew { dims, init, .. } => {
            for dim in dims {
                visitor.visit_expr(dim);
            }
            for element in init.iter().flatten() {
                visitor.visit_expr(element);
            }
        }
        Expr::ArrayInit { elements } => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        Expr::Lambda { body, .. } => match body {
            LambdaBody::Expr(expr) => visitor.visit_expr(expr),
            LambdaBody::Block(block) => visitor.visit_block(block),
        },
        Expr::MethodReference { target, .. } => visitor.visit_expr(target),
        Expr::Literal { .. }
        | Expr::ClassLiteral { .. }
        | Expr::Name { .. }
        | Expr::This { .. }
        | Expr::Super { .. }
        | Expr::Local { .. }
        | Expr::OuterThis { .. }
        | Expr::CapturedLocal { .. }
        | Expr::TypePath { .. } => {}
    }
}
